//! Core error types for the ledger and performance engines.
//!
//! Structural and invariant violations are rejected at the boundary of the
//! ledger model and never partially applied. Computational undefined-ness
//! (zero shares held, an IRR series with no sign change) is represented in
//! the result types as `Option::None`, not as an error.

use chrono::{NaiveDate, ParseError as ChronoParseError};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::fx::FxError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the accounting core.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Lot matching failed: {0}")]
    Lot(#[from] LotError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Errors raised by the ledger entry model.
///
/// `InvalidLedgerState` is terminal for the offending input: the transaction
/// is rejected, never auto-corrected. `LockedAccount` is recoverable; the
/// stored transaction is left untouched and the caller is expected to surface
/// the condition to the user.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid ledger state: {0}")]
    InvalidLedgerState(String),

    #[error("Account '{0}' is locked")]
    LockedAccount(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Entry index {index} out of bounds for transaction {transaction_id}")]
    EntryOutOfBounds {
        transaction_id: String,
        index: usize,
    },
}

/// Errors raised by the lot matching engine.
#[derive(Error, Debug)]
pub enum LotError {
    #[error(
        "Insufficient open lots for {security_id}: requested {requested}, available {available} on {date}"
    )]
    InsufficientLots {
        security_id: String,
        requested: Decimal,
        available: Decimal,
        date: NaiveDate,
    },

    #[error("Invalid investment event: {0}")]
    InvalidEvent(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Export(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Export(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
