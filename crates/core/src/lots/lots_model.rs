//! Lot matching domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::QUANTITY_THRESHOLD;
use crate::money::MonetaryAmount;

/// True when a share quantity is large enough to matter; residues below the
/// threshold are treated as a closed position.
pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold =
        Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 8));
    quantity.abs() >= threshold
}

/// A discrete quantity of a security acquired at a specific date and unit
/// cost, tracked until fully disposed.
///
/// Owned exclusively by the matching engine's open-lot queue, which is
/// rebuilt fresh from the immutable transaction log on every computation.
/// `quantity` only ever decreases after creation; the lot is dropped from
/// the open set when it reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentLot {
    pub id: String,
    pub security_id: String,
    pub account_id: String,
    pub open_date: NaiveDate,
    pub quantity: Decimal,
    /// Acquisition cost per share, fees included, in the account currency.
    pub unit_cost_basis: MonetaryAmount,
    /// Marks an uncovered short position opened by an over-sell.
    pub short: bool,
}

impl InvestmentLot {
    /// Total remaining cost basis of the lot.
    pub fn cost_basis(&self) -> MonetaryAmount {
        self.unit_cost_basis.scaled_by(self.quantity)
    }
}

/// The closure of (part of) one lot by one sell event. Immutable; produced
/// once per lot touched per sell, proceeds apportioned pro-rata by the
/// quantity consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedGain {
    pub security_id: String,
    pub lot_id: String,
    pub quantity_closed: Decimal,
    pub proceeds: MonetaryAmount,
    pub cost_basis: MonetaryAmount,
    pub close_date: NaiveDate,
}

impl RealizedGain {
    /// Proceeds minus cost basis, in the account currency.
    pub fn gain(&self) -> MonetaryAmount {
        MonetaryAmount::new(
            self.proceeds.value - self.cost_basis.value,
            self.proceeds.currency.clone(),
        )
    }
}

/// What to do when a sell exceeds the open quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShortSalePolicy {
    /// Reject the sell with `InsufficientLots`; nothing is applied.
    #[default]
    Reject,
    /// Track the shortfall as a flagged negative-quantity lot at zero basis.
    TrackShort,
}

/// Return-of-capital handling. The choice is deterministic either way; see
/// the variant docs for the exact rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RocPolicy {
    /// Reduce each remaining open lot's cost basis pro-rata by quantity,
    /// clamped at zero per lot. Any excess beyond the available basis, or a
    /// distribution with no open lots, books as income.
    #[default]
    ReduceCostBasis,
    /// Book the whole distribution as income; lots are untouched.
    Income,
}

/// One investment transaction, reduced to what the matching engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentEvent {
    pub id: String,
    pub date: NaiveDate,
    /// Stable insertion id; breaks same-date ordering ties.
    pub sequence: u64,
    pub kind: InvestmentEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentEventKind {
    Buy {
        quantity: Decimal,
        unit_price: Decimal,
        fees: Decimal,
    },
    Sell {
        quantity: Decimal,
        unit_price: Decimal,
        fees: Decimal,
    },
    Dividend {
        amount: Decimal,
    },
    ReturnOfCapital {
        amount: Decimal,
    },
}

/// A dated income contribution: a dividend, or the part of a
/// return-of-capital distribution that did not reduce lot basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeEvent {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Result of matching one security's event stream in one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotMatchOutcome {
    /// Currently open lots, oldest first. Negative-quantity lots appear here
    /// when short positions are tracked.
    pub open_lots: VecDeque<InvestmentLot>,
    /// Every lot closure, in event order.
    pub realized: Vec<RealizedGain>,
    /// Non-price cash total: dividends, plus return-of-capital amounts that
    /// did not reduce lot basis. Sum of `income_events`.
    pub income: MonetaryAmount,
    /// The income contributions with their dates, for historical-rate
    /// conversion downstream.
    pub income_events: Vec<IncomeEvent>,
    /// Set when any over-sell opened a short lot.
    pub short_position: bool,
}

impl LotMatchOutcome {
    /// Net shares currently held; negative under a tracked short.
    pub fn shares_held(&self) -> Decimal {
        self.open_lots.iter().map(|lot| lot.quantity).sum()
    }

    /// Remaining cost basis across open lots, in the account currency.
    pub fn open_cost_basis(&self) -> MonetaryAmount {
        let total: Decimal = self
            .open_lots
            .iter()
            .map(|lot| lot.cost_basis().value)
            .sum();
        MonetaryAmount::new(total, self.income.currency.clone())
    }

    /// Realized gain summed in the account currency.
    pub fn realized_gain_total(&self) -> MonetaryAmount {
        let total: Decimal = self.realized.iter().map(|r| r.gain().value).sum();
        MonetaryAmount::new(total, self.income.currency.clone())
    }
}
