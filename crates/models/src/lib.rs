pub mod errors;
pub mod db;
pub mod enums;
pub mod branch;
pub mod user;
pub mod user_credentials;
pub mod account;
pub mod transaction;
pub mod otp_verification;

pub use rust_decimal::Decimal;

#[cfg(test)]
mod tests;
