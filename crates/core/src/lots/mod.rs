//! Lot matching module - FIFO cost-basis tracking for investment positions.

mod lot_matcher;
mod lots_model;

pub use lot_matcher::{events_from_transactions, LotMatcher};
pub use lots_model::{
    is_quantity_significant, IncomeEvent, InvestmentEvent, InvestmentEventKind, InvestmentLot,
    LotMatchOutcome, RealizedGain, RocPolicy, ShortSalePolicy,
};
