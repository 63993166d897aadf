use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use models::account;
use models::enums::{AccountStatus, AccountType};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::rules::RuleViolation;
use crate::transaction::domain::DEPOSIT_CEILING;
use crate::validation::{Validate, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAccountInput {
    /// Owner; defaults to the caller for customers.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Defaults to the owner's home branch.
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    pub account_type: AccountType,
    #[serde(default)]
    pub initial_deposit: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateAccountStatusInput {
    pub status: AccountStatus,
}

/// New status for an account, optionally soft-deleting it.
///
/// Repositories check it against the row as locked, so a balance that
/// changed after the caller's read is still seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: AccountStatus,
    pub soft_delete: bool,
}

impl StatusChange {
    pub fn to(status: AccountStatus) -> Self { Self { status, soft_delete: false } }

    /// Close and hide.
    pub fn delete() -> Self { Self { status: AccountStatus::Closed, soft_delete: true } }

    /// `Closed` is terminal; closing or deleting needs a zero balance.
    pub fn check(&self, acc: &account::Model) -> Result<(), ServiceError> {
        if acc.state()? == AccountStatus::Closed && self.status != AccountStatus::Closed {
            return Err(ServiceError::Conflict("closed accounts cannot be reopened".into()));
        }
        if (self.status == AccountStatus::Closed || self.soft_delete) && !acc.balance.is_zero() {
            return Err(RuleViolation::NonZeroBalance { balance: acc.balance }.into());
        }
        Ok(())
    }

    /// Touches status, the deleted flag and `updated_at` only.
    pub fn apply(&self, acc: &mut account::Model, now: DateTime<Utc>) {
        acc.status = self.status.as_str().to_string();
        acc.is_deleted |= self.soft_delete;
        acc.updated_at = now.into();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountView {
    pub id: Uuid,
    pub account_number: String,
    pub user_id: Uuid,
    pub branch_id: Uuid,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub status: AccountStatus,
    pub opened_at: DateTime<Utc>,
}

impl TryFrom<account::Model> for AccountView {
    type Error = ServiceError;

    fn try_from(a: account::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            account_type: a.kind()?,
            status: a.state()?,
            id: a.id,
            account_number: a.account_number,
            user_id: a.user_id,
            branch_id: a.branch_id,
            balance: a.balance,
            opened_at: a.opened_at.with_timezone(&Utc),
        })
    }
}

/// Aggregate over live accounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccountSummary {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_type: BTreeMap<String, u64>,
    /// Sum of balances over accounts that are not closed.
    pub total_balance: Decimal,
}

impl AccountSummary {
    pub fn from_accounts<'a>(accounts: impl IntoIterator<Item = &'a account::Model>) -> Self {
        let mut s = Self::default();
        for a in accounts {
            s.total += 1;
            *s.by_status.entry(a.status.clone()).or_default() += 1;
            *s.by_type.entry(a.account_type.clone()).or_default() += 1;
            if a.status != AccountStatus::Closed.as_str() {
                s.total_balance += a.balance;
            }
        }
        s
    }
}

/// Twelve digits, never starting with zero.
pub fn generate_account_number() -> String {
    let mut rng = rand::thread_rng();
    let mut n = String::with_capacity(12);
    n.push(char::from(b'0' + rng.gen_range(1..=9u8)));
    for _ in 0..11 {
        n.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }
    n
}

impl Validate for OpenAccountInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        if self.initial_deposit < Decimal::ZERO {
            e.add("initial_deposit", "initial_deposit must not be negative");
        } else if self.initial_deposit > Decimal::ZERO {
            e.amount("initial_deposit", self.initial_deposit, DEPOSIT_CEILING);
        }
        e.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn account_numbers_are_twelve_digits() {
        for _ in 0..200 {
            let n = generate_account_number();
            assert!(account::validate_account_number(&n).is_ok(), "{n}");
            assert!(!n.starts_with('0'));
        }
    }

    #[test]
    fn opening_deposit_validation() {
        let mut input = OpenAccountInput { user_id: None, branch_id: None, account_type: AccountType::Salary, initial_deposit: dec!(0) };
        assert!(input.validate().is_ok());
        input.initial_deposit = dec!(-1);
        assert!(input.validate().is_err());
        input.initial_deposit = dec!(1000.001);
        assert!(input.validate().is_err());
        input.initial_deposit = dec!(2000000);
        assert!(input.validate().is_err());
    }
}
