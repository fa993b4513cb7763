use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-security, per-account performance metrics as of a report date.
///
/// All monetary fields are in the base (reporting) currency. Recomputed on
/// demand from the transaction log, never persisted. `None` is the sentinel
/// for mathematically undefined metrics (zero shares held, no solvable IRR);
/// the computation never substitutes a bogus numeric value for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPerformance {
    pub security_id: String,
    pub account_id: String,
    pub base_currency: String,
    /// Net shares currently held; negative for a tracked short.
    pub shares_held: Decimal,
    /// Undefined when no shares are held.
    pub cost_basis_per_share: Option<Decimal>,
    /// Remaining cost basis of open lots, converted at the report date.
    pub total_cost_basis: Decimal,
    /// Latest known price as of the report date, converted at the report
    /// date. Zero when the market-data collaborator has no quote.
    pub price: Decimal,
    pub market_value: Decimal,
    pub unrealized_gain: Decimal,
    /// Realized gains plus income, each converted at its own historical date.
    pub realized_gain: Decimal,
    pub total_gain: Decimal,
    /// Undefined when the aggregate acquisition basis is zero.
    pub total_gain_percentage: Option<Decimal>,
    /// Undefined when the cash-flow series has no solvable rate.
    pub irr: Option<f64>,
    pub short_position: bool,
}
