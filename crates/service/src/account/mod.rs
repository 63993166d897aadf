//! Bank accounts: opening, lookup, status changes and closure.

pub mod domain;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use service::AccountService;
