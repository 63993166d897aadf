//! Input validation shared by every request DTO.
//!
//! Validators collect all failures per field instead of stopping at the
//! first one, so clients can render them next to each input.

use std::fmt;

use common::FieldErrors;
use models::errors::ModelError;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(FieldErrors);

impl ValidationErrors {
    pub fn new() -> Self { Self::default() }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut e = Self::new();
        e.add(field, message);
        e
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    /// Record a model-level check under `field`.
    pub fn check(&mut self, field: &str, result: Result<(), ModelError>) {
        if let Err(e) = result {
            let msg = match e {
                ModelError::Validation(m) => m,
                other => other.to_string(),
            };
            self.add(field, msg);
        }
    }

    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{} is required", field));
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("{} must be at most {} characters", field, max));
        }
    }

    /// Positive, at most two decimal places, not above `ceiling`.
    pub fn amount(&mut self, field: &str, amount: Decimal, ceiling: Decimal) {
        if amount <= Decimal::ZERO {
            self.add(field, format!("{} must be greater than 0", field));
            return;
        }
        if amount.normalize().scale() > 2 {
            self.add(field, format!("{} must have at most 2 decimal places", field));
        }
        if amount > ceiling {
            self.add(field, format!("{} must not exceed {}", field, ceiling));
        }
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn fields(&self) -> &FieldErrors { &self.0 }

    pub fn into_inner(self) -> FieldErrors { self.0 }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, msgs) in &self.0 {
            for m in msgs {
                if !first { f.write_str("; ")?; }
                write!(f, "{}: {}", field, m)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Emails are compared case-insensitively and stored lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Implemented by every request DTO accepted by a service.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}
