use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A security price quote as of some date, in the quote's own currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPrice {
    pub security_id: String,
    pub date: NaiveDate,
    pub price: Decimal,
    pub currency: String,
}

/// Contract for the market-data collaborator.
///
/// The core never fetches prices itself; it consumes already-resolved quotes
/// through this trait, so the computation has no suspension points.
pub trait PriceProviderTrait: Send + Sync {
    /// Latest known price for the security on or before `date`, if any.
    fn price_as_of(&self, security_id: &str, date: NaiveDate) -> Option<SecurityPrice>;
}
