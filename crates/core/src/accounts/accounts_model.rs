//! Account domain models.
//!
//! Accounts are owned by the persistence collaborator; the core only reads
//! and validates them. `locked` and `hidden` are authoritative at edit time:
//! a locked account rejects new or modified transactions, a hidden account is
//! skipped by reporting but still participates in balance checks.

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// Account family, determining how the account participates in reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    #[default]
    Bank,
    Cash,
    Checking,
    CreditCard,
    Expense,
    Income,
    Investment,
    Liability,
}

impl AccountKind {
    /// Investment accounts are the only ones carrying security lots.
    pub fn is_investment(&self) -> bool {
        matches!(self, AccountKind::Investment)
    }
}

/// Domain model representing an account in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub locked: bool,
    pub hidden: bool,
    pub kind: AccountKind,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        currency: impl Into<String>,
        kind: AccountKind,
    ) -> Self {
        Account {
            id: id.into(),
            name: name.into(),
            currency: currency.into(),
            locked: false,
            hidden: false,
            kind,
        }
    }

    /// Validates account data received from the persistence collaborator.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account id cannot be empty".to_string(),
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account currency cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}
