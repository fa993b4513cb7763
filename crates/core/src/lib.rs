//! Finledger Core - double-entry ledger and investment performance engine.
//!
//! This crate contains the accounting core of the ledger application: the
//! transaction/split model with its validity invariants, FIFO lot matching
//! for cost-basis tracking, the performance summary engine, and the IRR
//! solver. It is storage-agnostic and consumes prices, exchange rates, and
//! account metadata as already-resolved inputs from external collaborators.

pub mod accounts;
pub mod constants;
pub mod errors;
pub mod fx;
pub mod ledger;
pub mod lots;
pub mod money;
pub mod performance;

// Re-export common types
pub use accounts::{Account, AccountKind};
pub use ledger::{Ledger, ReconciledState, Transaction, TransactionEntry};
pub use lots::{InvestmentLot, LotMatcher, RealizedGain};
pub use money::MonetaryAmount;
pub use performance::{PerformanceService, SecurityPerformance};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
