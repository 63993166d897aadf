//! Users: customer self-registration, branch managers and administration.

pub mod domain;
pub mod registration;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use registration::RegistrationService;
pub use service::UserService;
