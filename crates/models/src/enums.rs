//! String-coded enums persisted in `varchar` columns.
//!
//! Columns store the variant name (`"BranchManager"`, `"Savings"`, ...); the
//! same spelling is used on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name { $($variant),+ }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self { $($name::$variant => stringify!($variant)),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err(ModelError::UnknownCode { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

string_enum!(
    /// Access level carried in issued tokens.
    UserRole, "role" { Admin, BranchManager, Customer }
);

string_enum!(UserStatus, "user status" { PendingVerification, Active, Inactive, Suspended });

string_enum!(BranchType, "branch type" { Main, Regional, Urban, Rural });

string_enum!(AccountType, "account type" { Savings, Current, Salary, FixedDeposit });

string_enum!(
    /// `Closed` is terminal.
    AccountStatus, "account status" { Active, Frozen, Closed }
);

string_enum!(TransactionType, "transaction type" { Deposit, Withdrawal, Transfer });

string_enum!(TransactionStatus, "transaction status" { Completed, Failed });

string_enum!(OtpPurpose, "otp purpose" { Registration, PasswordReset, Transaction });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_strings() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), *role);
        }
        assert_eq!(AccountType::FixedDeposit.to_string(), "FixedDeposit");
    }

    #[test]
    fn unknown_code_is_an_error() {
        let err = "Teller".parse::<UserRole>().unwrap_err();
        assert!(err.to_string().contains("Teller"));
    }

    #[test]
    fn serde_uses_variant_names() {
        let v = serde_json::to_value(UserRole::BranchManager).unwrap();
        assert_eq!(v, serde_json::json!("BranchManager"));
        let t: AccountStatus = serde_json::from_str("\"Frozen\"").unwrap();
        assert_eq!(t, AccountStatus::Frozen);
    }
}
