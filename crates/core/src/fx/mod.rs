//! FX (foreign exchange) module - historical rate table and conversions.

mod fx_errors;
mod fx_model;
mod rate_table;

pub use fx_errors::FxError;
pub use fx_model::ExchangeRate;
pub use rate_table::RateTable;
