//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Login, token issuance/verification, password changes and OTP-backed
//! password resets.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod seaorm;
pub mod service;
pub mod token;

pub use service::AuthService;
