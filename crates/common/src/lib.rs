pub mod types;
pub mod utils;
pub mod env;

pub use types::{ApiEnvelope, FieldErrors, Health};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }
}
