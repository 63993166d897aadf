//! Typed HTTP client for the bank simulation API.
//!
//! Handles the concerns a web frontend would: every response normalized to
//! the `{success, message, data, errors}` envelope, 401 handling, and
//! de-duplication of identical in-flight requests.

pub mod api;
pub mod endpoints;
pub mod error;
pub mod listener;
pub mod pending;
pub mod token;

pub use api::ApiClient;
pub use endpoints::Session;
pub use error::ClientError;
pub use listener::{ErrorListener, LogErrorListener};
pub use token::{MemoryTokenStore, TokenStore};
