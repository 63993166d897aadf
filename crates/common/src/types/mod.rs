use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Field name -> messages, as produced by input validation.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Uniform wrapper returned by every API endpoint, success or failure.
///
/// Transport status is always 200; callers branch on `success`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, message: "OK".into(), data: Some(data), errors: None }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), data: Some(data), errors: None }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), data: None, errors: None }
    }

    pub fn fail_with_errors(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self { success: false, message: message.into(), data: None, errors: Some(errors) }
    }
}

impl ApiEnvelope<serde_json::Value> {
    /// Best-effort check whether a raw JSON body is already an envelope.
    pub fn looks_like_envelope(raw: &[u8]) -> bool {
        match serde_json::from_slice::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => {
                map.get("success").map(|v| v.is_boolean()).unwrap_or(false) && map.contains_key("message")
            }
            _ => false,
        }
    }
}
