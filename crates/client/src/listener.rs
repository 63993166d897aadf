use tracing::warn;

/// Notified about failed calls; a UI shows a toast or redirects to login.
pub trait ErrorListener: Send + Sync {
    /// `status` is the logical status: `X-Status-Code` when present, else the
    /// transport status, 0 for network failures.
    fn on_error(&self, message: &str, status: u16);

    fn on_session_expired(&self) {}
}

/// Logs failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorListener;

impl ErrorListener for LogErrorListener {
    fn on_error(&self, message: &str, status: u16) {
        warn!(status, %message, "api_call_failed");
    }

    fn on_session_expired(&self) {
        warn!("session expired; token cleared");
    }
}
