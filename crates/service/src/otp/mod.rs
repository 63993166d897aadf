//! One-time codes for registration, password reset and transaction
//! confirmation.

pub mod domain;
pub mod repository;
pub mod seaorm;
pub mod sender;
pub mod service;

pub use sender::{LogOtpSender, OtpSender, RecordingOtpSender};
pub use service::{OtpService, OtpSettings};
