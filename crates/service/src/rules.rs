//! Account-type rules and the checks applied before money moves.
//!
//! The checks are pure so they can run both as a pre-check in services and
//! again inside the database transaction against freshly locked rows.

use models::account;
use models::enums::{AccountStatus, AccountType};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountTypeRules {
    pub min_opening: Decimal,
    pub min_balance: Decimal,
    /// Largest single debit; `None` when debits are not allowed at all.
    pub debit_cap: Option<Decimal>,
}

impl AccountTypeRules {
    pub fn debits_allowed(&self) -> bool { self.debit_cap.is_some() }
}

pub fn rules_for(kind: AccountType) -> AccountTypeRules {
    match kind {
        AccountType::Savings => AccountTypeRules {
            min_opening: Decimal::from(1_000),
            min_balance: Decimal::from(1_000),
            debit_cap: Some(Decimal::from(100_000)),
        },
        AccountType::Current => AccountTypeRules {
            min_opening: Decimal::from(5_000),
            min_balance: Decimal::from(5_000),
            debit_cap: Some(Decimal::from(500_000)),
        },
        AccountType::Salary => AccountTypeRules {
            min_opening: Decimal::ZERO,
            min_balance: Decimal::ZERO,
            debit_cap: Some(Decimal::from(200_000)),
        },
        AccountType::FixedDeposit => AccountTypeRules {
            min_opening: Decimal::from(10_000),
            min_balance: Decimal::ZERO,
            debit_cap: None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("account {account_number} is {status}")]
    AccountNotActive { account_number: String, status: AccountStatus },
    #[error("{account_type} accounts do not allow withdrawals or outgoing transfers")]
    DebitsNotAllowed { account_type: AccountType },
    #[error("amount exceeds the {account_type} per-transaction limit of {cap}")]
    ExceedsDebitCap { account_type: AccountType, cap: Decimal },
    #[error("insufficient funds: available {available}")]
    InsufficientFunds { available: Decimal },
    #[error("{account_type} accounts require an opening deposit of at least {minimum}")]
    BelowMinimumOpening { account_type: AccountType, minimum: Decimal },
    #[error("source and destination accounts must differ")]
    SameAccount,
    #[error("account balance must be zero, found {balance}")]
    NonZeroBalance { balance: Decimal },
}

fn require_active(acc: &account::Model) -> Result<(), ServiceError> {
    let status = acc.state()?;
    if acc.is_deleted || status != AccountStatus::Active {
        let status = if acc.is_deleted { AccountStatus::Closed } else { status };
        return Err(RuleViolation::AccountNotActive { account_number: acc.account_number.clone(), status }.into());
    }
    Ok(())
}

/// Money may be credited to active accounts only.
pub fn check_credit(acc: &account::Model, _amount: Decimal) -> Result<(), ServiceError> {
    require_active(acc)
}

/// Debits need an active account of a debit-capable type, within the cap,
/// leaving at least the minimum balance.
pub fn check_debit(acc: &account::Model, amount: Decimal) -> Result<(), ServiceError> {
    require_active(acc)?;
    let account_type = acc.kind()?;
    let rules = rules_for(account_type);
    let cap = rules.debit_cap.ok_or(RuleViolation::DebitsNotAllowed { account_type })?;
    if amount > cap {
        return Err(RuleViolation::ExceedsDebitCap { account_type, cap }.into());
    }
    let available = (acc.balance - rules.min_balance).max(Decimal::ZERO);
    if amount > available {
        return Err(RuleViolation::InsufficientFunds { available }.into());
    }
    Ok(())
}

pub fn check_opening(account_type: AccountType, deposit: Decimal) -> Result<(), RuleViolation> {
    let minimum = rules_for(account_type).min_opening;
    if deposit < minimum {
        return Err(RuleViolation::BelowMinimumOpening { account_type, minimum });
    }
    Ok(())
}
