use service::AppServices;

/// Shared handler state. Cloned per request; every field is an `Arc` inside.
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    /// Mark the `auth_token` cookie `Secure`.
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(services: AppServices) -> Self {
        Self { services, secure_cookies: false }
    }
}
