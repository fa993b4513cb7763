//! Ledger module - double-entry transaction model and the ledger service.

mod ledger_model;
mod ledger_service;

pub use ledger_model::{
    EntrySide, InvestmentDetails, InvestmentKind, ReconciledState, Transaction, TransactionDraft,
    TransactionEntry, TransactionEntryDraft, TransactionKind,
};
pub use ledger_service::Ledger;
