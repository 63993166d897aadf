use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use models::enums::{TransactionStatus, TransactionType};
use models::{account, transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::rules::{check_credit, check_debit, RuleViolation};
use crate::validation::{Validate, ValidationErrors};

pub const DEPOSIT_CEILING: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
pub const WITHDRAW_CEILING: Decimal = Decimal::from_parts(200_000, 0, 0, false, 0);
pub const TRANSFER_CEILING: Decimal = Decimal::from_parts(500_000, 0, 0, false, 0);
pub const DESCRIPTION_MAX: usize = 250;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositInput {
    pub account_id: Uuid,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawInput {
    pub account_id: Uuid,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

/// The destination is given either by id or by account number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferInput {
    pub from_account_id: Uuid,
    #[serde(default)]
    pub to_account_id: Option<Uuid>,
    #[serde(default)]
    pub to_account_number: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

fn check_description(e: &mut ValidationErrors, description: &Option<String>) {
    if let Some(d) = description {
        e.max_len("description", d, DESCRIPTION_MAX);
    }
}

impl Validate for DepositInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.amount("amount", self.amount, DEPOSIT_CEILING);
        check_description(&mut e, &self.description);
        e.into_result()
    }
}

impl Validate for WithdrawInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.amount("amount", self.amount, WITHDRAW_CEILING);
        check_description(&mut e, &self.description);
        e.into_result()
    }
}

impl Validate for TransferInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut e = ValidationErrors::new();
        e.amount("amount", self.amount, TRANSFER_CEILING);
        check_description(&mut e, &self.description);
        match (&self.to_account_id, &self.to_account_number) {
            (None, None) => e.add("to_account_id", "destination account is required"),
            (Some(to), _) if *to == self.from_account_id => {
                e.add("to_account_id", "source and destination accounts must differ")
            }
            (None, Some(number)) => e.check("to_account_number", account::validate_account_number(number)),
            _ => {}
        }
        e.into_result()
    }
}

/// `TXN` followed by 16 upper-case hex digits.
pub fn new_reference() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("TXN{}", &hex[..16])
}

/// A validated money movement ready to be applied to locked accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub kind: TransactionType,
    pub from: Option<Uuid>,
    pub to: Option<Uuid>,
    pub amount: Decimal,
    pub description: String,
    pub created_by: Uuid,
}

impl Posting {
    /// Ids of the affected accounts in lock order.
    pub fn lock_order(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.from.into_iter().chain(self.to).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Re-check the rules against current balances, move the money and
    /// build the ledger row. Accounts are only modified on success.
    pub fn apply(
        &self,
        from: Option<&mut account::Model>,
        to: Option<&mut account::Model>,
        now: DateTime<Utc>,
    ) -> Result<transaction::Model, ServiceError> {
        if self.from.is_some() && self.from == self.to {
            return Err(RuleViolation::SameAccount.into());
        }
        if let Some(src) = from.as_deref() {
            check_debit(src, self.amount)?;
        }
        if let Some(dst) = to.as_deref() {
            check_credit(dst, self.amount)?;
        }
        let from_balance_after = from.map(|a| {
            a.balance -= self.amount;
            a.updated_at = now.into();
            a.balance
        });
        let to_balance_after = to.map(|a| {
            a.balance += self.amount;
            a.updated_at = now.into();
            a.balance
        });
        Ok(transaction::Model {
            id: Uuid::new_v4(),
            reference: new_reference(),
            from_account_id: self.from,
            to_account_id: self.to,
            amount: self.amount,
            transaction_type: self.kind.as_str().to_string(),
            status: TransactionStatus::Completed.as_str().to_string(),
            description: self.description.clone(),
            from_balance_after,
            to_balance_after,
            created_by: Some(self.created_by),
            transaction_date: now.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionView {
    pub id: Uuid,
    pub reference: String,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub description: String,
    pub from_balance_after: Option<Decimal>,
    pub to_balance_after: Option<Decimal>,
    pub transaction_date: DateTime<Utc>,
}

impl TryFrom<transaction::Model> for TransactionView {
    type Error = ServiceError;

    fn try_from(t: transaction::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            transaction_type: t.kind()?,
            status: t.state()?,
            id: t.id,
            reference: t.reference,
            from_account_id: t.from_account_id,
            to_account_id: t.to_account_id,
            amount: t.amount,
            description: t.description,
            from_balance_after: t.from_balance_after,
            to_balance_after: t.to_balance_after,
            transaction_date: t.transaction_date.with_timezone(&Utc),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionStats {
    pub count: u64,
    pub volume: Decimal,
    pub by_type: BTreeMap<String, u64>,
}

impl TransactionStats {
    pub fn add(&mut self, t: &transaction::Model) {
        self.count += 1;
        self.volume += t.amount;
        *self.by_type.entry(t.transaction_type.clone()).or_default() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::enums::{AccountStatus, AccountType};
    use rust_decimal_macros::dec;

    fn transfer(amount: Decimal) -> TransferInput {
        TransferInput {
            from_account_id: Uuid::new_v4(),
            to_account_id: Some(Uuid::new_v4()),
            to_account_number: None,
            amount,
            description: None,
        }
    }

    #[test]
    fn ceilings_per_kind() {
        let id = Uuid::new_v4();
        assert!(DepositInput { account_id: id, amount: dec!(1000000), description: None }.validate().is_ok());
        assert!(DepositInput { account_id: id, amount: dec!(1000000.01), description: None }.validate().is_err());
        assert!(WithdrawInput { account_id: id, amount: dec!(200000), description: None }.validate().is_ok());
        assert!(WithdrawInput { account_id: id, amount: dec!(200001), description: None }.validate().is_err());
        assert!(transfer(dec!(500000)).validate().is_ok());
    }

    #[test]
    fn oversized_transfer_reports_amount() {
        let err = transfer(dec!(600000)).validate().unwrap_err();
        assert_eq!(err.fields()["amount"], vec!["amount must not exceed 500000".to_string()]);
    }

    #[test]
    fn non_positive_amounts_rejected() {
        assert!(transfer(dec!(0)).validate().is_err());
        assert!(transfer(dec!(-10)).validate().is_err());
    }

    #[test]
    fn transfer_needs_distinct_destination() {
        let mut t = transfer(dec!(10));
        t.to_account_id = Some(t.from_account_id);
        assert!(t.validate().unwrap_err().fields().contains_key("to_account_id"));
        t.to_account_id = None;
        assert!(t.validate().is_err());
        t.to_account_number = Some("501234567890".into());
        assert!(t.validate().is_ok());
    }

    #[test]
    fn long_description_rejected() {
        let input = DepositInput { account_id: Uuid::new_v4(), amount: dec!(10), description: Some("x".repeat(251)) };
        assert!(input.validate().unwrap_err().fields().contains_key("description"));
    }

    #[test]
    fn references_have_fixed_shape() {
        let r = new_reference();
        assert_eq!(r.len(), 19);
        assert!(r.starts_with("TXN"));
        assert!(r[3..].chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    fn acc(kind: AccountType, balance: Decimal) -> account::Model {
        let now = Utc::now().into();
        account::Model {
            id: Uuid::new_v4(),
            account_number: "501234567890".into(),
            user_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            account_type: kind.as_str().into(),
            balance,
            status: AccountStatus::Active.as_str().into(),
            is_deleted: false,
            created_by: None,
            opened_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn apply_moves_money_and_records_balances() {
        let mut a = acc(AccountType::Savings, dec!(10000));
        let mut b = acc(AccountType::Current, dec!(5000));
        let p = Posting { kind: TransactionType::Transfer, from: Some(a.id), to: Some(b.id), amount: dec!(2500.50), description: "rent".into(), created_by: a.user_id };
        let row = p.apply(Some(&mut a), Some(&mut b), Utc::now()).unwrap();
        assert_eq!(a.balance, dec!(7499.50));
        assert_eq!(b.balance, dec!(7500.50));
        assert_eq!(row.from_balance_after, Some(dec!(7499.50)));
        assert_eq!(row.to_balance_after, Some(dec!(7500.50)));
        assert_eq!(row.status, "Completed");
    }

    #[test]
    fn apply_leaves_accounts_untouched_on_rule_failure() {
        let mut a = acc(AccountType::Savings, dec!(1500));
        let mut b = acc(AccountType::Savings, dec!(1500));
        let p = Posting { kind: TransactionType::Transfer, from: Some(a.id), to: Some(b.id), amount: dec!(600), description: String::new(), created_by: a.user_id };
        assert!(p.apply(Some(&mut a), Some(&mut b), Utc::now()).is_err());
        assert_eq!(a.balance, dec!(1500));
        assert_eq!(b.balance, dec!(1500));
    }

    #[test]
    fn lock_order_is_sorted() {
        let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
        let p = Posting { kind: TransactionType::Transfer, from: Some(x), to: Some(y), amount: dec!(1), description: String::new(), created_by: x };
        let mut expected = vec![x, y];
        expected.sort();
        assert_eq!(p.lock_order(), expected);
    }
}
