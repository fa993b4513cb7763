//! FIFO lot matching engine.
//!
//! Consumes a chronological stream of investment events for one security in
//! one account and produces the open-lot queue, the realized-gain records,
//! and the running income total. The engine owns its queue for the duration
//! of a single `match_events` call; nothing is shared or mutated in place
//! across computations.

use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::errors::{LotError, Result};
use crate::ledger::{InvestmentKind, Transaction, TransactionKind};
use crate::lots::lots_model::{
    is_quantity_significant, IncomeEvent, InvestmentEvent, InvestmentEventKind, InvestmentLot,
    LotMatchOutcome, RealizedGain, RocPolicy, ShortSalePolicy,
};
use crate::money::MonetaryAmount;

/// Reduces committed investment transactions to matching-engine events.
///
/// Buy/sell events take quantity and price from the trade details; dividend
/// and return-of-capital amounts are read off the transaction's cash effect
/// on the investment account. Transactions of other kinds are skipped.
pub fn events_from_transactions(transactions: &[Arc<Transaction>]) -> Vec<InvestmentEvent> {
    let mut events = Vec::with_capacity(transactions.len());
    for transaction in transactions {
        let TransactionKind::Investment(investment_kind) = transaction.kind else {
            continue;
        };
        let Some(details) = &transaction.investment else {
            // Unreachable for transactions validated by the ledger.
            warn!(
                "Investment transaction {} has no trade details. Skipped.",
                transaction.id
            );
            continue;
        };
        let kind = match investment_kind {
            InvestmentKind::Buy => InvestmentEventKind::Buy {
                quantity: details.quantity,
                unit_price: details.unit_price,
                fees: details.fees,
            },
            InvestmentKind::Sell => InvestmentEventKind::Sell {
                quantity: details.quantity,
                unit_price: details.unit_price,
                fees: details.fees,
            },
            InvestmentKind::Dividend => InvestmentEventKind::Dividend {
                amount: transaction.signed_effect_on(&details.account_id).abs(),
            },
            InvestmentKind::ReturnOfCapital => InvestmentEventKind::ReturnOfCapital {
                amount: transaction.signed_effect_on(&details.account_id).abs(),
            },
        };
        events.push(InvestmentEvent {
            id: transaction.id.clone(),
            date: transaction.date,
            sequence: transaction.sequence,
            kind,
        });
    }
    events
}

/// FIFO lot matching engine, parameterized by short-sale and
/// return-of-capital policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LotMatcher {
    pub short_sale_policy: ShortSalePolicy,
    pub roc_policy: RocPolicy,
}

impl LotMatcher {
    pub fn new(short_sale_policy: ShortSalePolicy, roc_policy: RocPolicy) -> Self {
        LotMatcher {
            short_sale_policy,
            roc_policy,
        }
    }

    /// Matches one security's event stream.
    ///
    /// Events are processed strictly in ascending date order with the
    /// insertion sequence as tie-break; the input is re-sorted on that key
    /// so the result is deterministic regardless of caller ordering.
    /// `currency` is the investment account's currency, which every monetary
    /// field of the outcome is denominated in.
    pub fn match_events(
        &self,
        security_id: &str,
        account_id: &str,
        currency: &str,
        events: &[InvestmentEvent],
    ) -> Result<LotMatchOutcome> {
        let mut ordered: Vec<&InvestmentEvent> = events.iter().collect();
        ordered.sort_by_key(|e| (e.date, e.sequence));

        let mut open_lots: VecDeque<InvestmentLot> = VecDeque::new();
        let mut realized: Vec<RealizedGain> = Vec::new();
        let mut income_events: Vec<IncomeEvent> = Vec::new();
        let mut short_position = false;

        for event in ordered {
            match &event.kind {
                InvestmentEventKind::Buy {
                    quantity,
                    unit_price,
                    fees,
                } => {
                    self.apply_buy(
                        &mut open_lots,
                        event,
                        security_id,
                        account_id,
                        currency,
                        *quantity,
                        *unit_price,
                        *fees,
                    )?;
                }
                InvestmentEventKind::Sell {
                    quantity,
                    unit_price,
                    fees,
                } => {
                    let opened_short = self.apply_sell(
                        &mut open_lots,
                        &mut realized,
                        event,
                        security_id,
                        account_id,
                        currency,
                        *quantity,
                        *unit_price,
                        *fees,
                    )?;
                    short_position |= opened_short;
                }
                InvestmentEventKind::Dividend { amount } => {
                    income_events.push(IncomeEvent {
                        date: event.date,
                        amount: *amount,
                    });
                }
                InvestmentEventKind::ReturnOfCapital { amount } => {
                    let to_income = self.apply_return_of_capital(&mut open_lots, *amount);
                    if !to_income.is_zero() {
                        income_events.push(IncomeEvent {
                            date: event.date,
                            amount: to_income,
                        });
                    }
                }
            }
        }

        let income: Decimal = income_events.iter().map(|e| e.amount).sum();
        Ok(LotMatchOutcome {
            open_lots,
            realized,
            income: MonetaryAmount::new(income, currency),
            income_events,
            short_position,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_buy(
        &self,
        open_lots: &mut VecDeque<InvestmentLot>,
        event: &InvestmentEvent,
        security_id: &str,
        account_id: &str,
        currency: &str,
        quantity: Decimal,
        unit_price: Decimal,
        fees: Decimal,
    ) -> Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(LotError::InvalidEvent(format!(
                "Buy {} has non-positive quantity {}",
                event.id, quantity
            ))
            .into());
        }
        // Fees capitalize into the basis.
        let unit_cost_basis = (quantity * unit_price + fees) / quantity;
        open_lots.push_back(InvestmentLot {
            id: event.id.clone(),
            security_id: security_id.to_string(),
            account_id: account_id.to_string(),
            open_date: event.date,
            quantity,
            unit_cost_basis: MonetaryAmount::new(unit_cost_basis, currency),
            short: false,
        });
        debug!(
            "Opened lot {} for {}: {} @ {}",
            event.id, security_id, quantity, unit_cost_basis
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_sell(
        &self,
        open_lots: &mut VecDeque<InvestmentLot>,
        realized: &mut Vec<RealizedGain>,
        event: &InvestmentEvent,
        security_id: &str,
        account_id: &str,
        currency: &str,
        quantity: Decimal,
        unit_price: Decimal,
        fees: Decimal,
    ) -> Result<bool> {
        if quantity <= Decimal::ZERO {
            return Err(LotError::InvalidEvent(format!(
                "Sell {} has non-positive quantity {}",
                event.id, quantity
            ))
            .into());
        }

        let available: Decimal = open_lots
            .iter()
            .filter(|lot| !lot.short)
            .map(|lot| lot.quantity)
            .sum();
        if available < quantity && self.short_sale_policy == ShortSalePolicy::Reject {
            // Reject before touching the queue; the sell is left unapplied.
            return Err(LotError::InsufficientLots {
                security_id: security_id.to_string(),
                requested: quantity,
                available,
                date: event.date,
            }
            .into());
        }

        // Proceeds net of fees, apportioned pro-rata by quantity consumed.
        let total_proceeds = quantity * unit_price - fees;
        let mut remaining = quantity;

        // Short lots stay in place; the drain consumes long lots oldest
        // first, skipping past any tracked short position in the queue.
        let mut index = 0;
        while remaining > Decimal::ZERO && index < open_lots.len() {
            if open_lots[index].short || open_lots[index].quantity <= Decimal::ZERO {
                index += 1;
                continue;
            }
            let lot = &mut open_lots[index];

            let consumed = lot.quantity.min(remaining);
            let proceeds_share = total_proceeds * consumed / quantity;
            let basis_share = lot.unit_cost_basis.scaled_by(consumed);

            realized.push(RealizedGain {
                security_id: security_id.to_string(),
                lot_id: lot.id.clone(),
                quantity_closed: consumed,
                proceeds: MonetaryAmount::new(proceeds_share, currency),
                cost_basis: basis_share,
                close_date: event.date,
            });

            lot.quantity -= consumed;
            remaining -= consumed;

            if !is_quantity_significant(&lot.quantity) {
                open_lots.remove(index);
            } else {
                index += 1;
            }
        }

        if remaining > Decimal::ZERO {
            // TrackShort fallback: the uncovered portion opens a flagged
            // negative-quantity lot with zero basis. No realized record is
            // emitted for it; there is no lot to realize against.
            warn!(
                "Sell {} oversold {} by {} shares; opening short lot",
                event.id, security_id, remaining
            );
            open_lots.push_back(InvestmentLot {
                id: format!("{}-short", event.id),
                security_id: security_id.to_string(),
                account_id: account_id.to_string(),
                open_date: event.date,
                quantity: -remaining,
                unit_cost_basis: MonetaryAmount::zero(currency),
                short: true,
            });
            return Ok(true);
        }

        Ok(false)
    }

    /// Applies a return-of-capital distribution and returns the portion that
    /// books as income under the active policy.
    fn apply_return_of_capital(
        &self,
        open_lots: &mut VecDeque<InvestmentLot>,
        amount: Decimal,
    ) -> Decimal {
        if self.roc_policy == RocPolicy::Income {
            return amount;
        }

        let total_quantity: Decimal = open_lots
            .iter()
            .filter(|lot| !lot.short)
            .map(|lot| lot.quantity)
            .sum();
        if !is_quantity_significant(&total_quantity) {
            // No open lots to reduce; the whole distribution is income.
            return amount;
        }

        let lot_count = open_lots.iter().filter(|lot| !lot.short).count();
        let mut overflow = Decimal::ZERO;
        let mut distributed = Decimal::ZERO;
        let mut position = 0;
        for lot in open_lots.iter_mut().filter(|lot| !lot.short) {
            position += 1;
            // The last lot takes the exact remainder, so the shares always
            // sum back to the full distribution amount.
            let share = if position == lot_count {
                amount - distributed
            } else {
                amount * lot.quantity / total_quantity
            };
            distributed += share;
            let lot_basis = lot.cost_basis().value;
            let reduction = share.min(lot_basis);
            overflow += share - reduction;
            if lot.quantity > Decimal::ZERO {
                lot.unit_cost_basis = MonetaryAmount::new(
                    (lot_basis - reduction) / lot.quantity,
                    lot.unit_cost_basis.currency.clone(),
                );
            }
        }
        overflow
    }
}
