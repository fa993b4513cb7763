//! Performance summary engine.
//!
//! Aggregates lot-matching output plus current market prices into
//! per-security metrics. Pure and idempotent over a ledger snapshot: safe to
//! cancel or recompute at any point, runs in parallel with other reads.
//!
//! Currency discipline (load-bearing): holdings convert to the base currency
//! at the report date; realized gains and income convert at their own
//! historical dates and are never re-marked to the report date.

use chrono::NaiveDate;
use log::{debug, warn};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::{LedgerError, Result};
use crate::fx::RateTable;
use crate::ledger::{Ledger, Transaction};
use crate::lots::{
    events_from_transactions, is_quantity_significant, InvestmentEvent, InvestmentEventKind,
    LotMatchOutcome, LotMatcher,
};
use crate::money::MonetaryAmount;
use crate::performance::irr::{internal_rate_of_return, CashFlow};
use crate::performance::performance_model::SecurityPerformance;
use crate::performance::performance_traits::PriceProviderTrait;

pub struct PerformanceService {
    prices: Arc<dyn PriceProviderTrait>,
    rates: RateTable,
    base_currency: String,
    matcher: LotMatcher,
}

impl PerformanceService {
    pub fn new(
        prices: Arc<dyn PriceProviderTrait>,
        rates: RateTable,
        base_currency: impl Into<String>,
    ) -> Self {
        PerformanceService {
            prices,
            rates,
            base_currency: base_currency.into(),
            matcher: LotMatcher::default(),
        }
    }

    /// Overrides the default lot-matching policies.
    pub fn with_matcher(mut self, matcher: LotMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Computes the performance summary for every security ever traded in
    /// the account, as of `as_of`.
    pub fn compute_performance_summary(
        &self,
        ledger: &Ledger,
        account_id: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<SecurityPerformance>> {
        let account = ledger
            .get_account(account_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        let mut summary = Vec::new();
        for security_id in ledger.securities_for_account(account_id) {
            let transactions: Vec<Arc<Transaction>> = ledger
                .investment_transactions(account_id, &security_id)
                .into_iter()
                .filter(|t| t.date <= as_of)
                .collect();
            if transactions.is_empty() {
                continue;
            }
            let events = events_from_transactions(&transactions);
            let outcome =
                self.matcher
                    .match_events(&security_id, account_id, &account.currency, &events)?;
            summary.push(self.security_performance(
                &security_id,
                account_id,
                &account.currency,
                as_of,
                &events,
                &outcome,
            )?);
        }
        debug!(
            "Computed performance for {} securities in account {} as of {}",
            summary.len(),
            account_id,
            as_of
        );
        Ok(summary)
    }

    fn security_performance(
        &self,
        security_id: &str,
        account_id: &str,
        account_currency: &str,
        as_of: NaiveDate,
        events: &[InvestmentEvent],
        outcome: &LotMatchOutcome,
    ) -> Result<SecurityPerformance> {
        let base = self.base_currency.as_str();
        let shares_held = outcome.shares_held();

        // Open holdings convert at the report date.
        let total_cost_basis = self
            .rates
            .convert(&outcome.open_cost_basis(), base, as_of)?
            .value;

        let cost_basis_per_share = if is_quantity_significant(&shares_held) {
            Some(total_cost_basis / shares_held)
        } else {
            None
        };

        let price = match self.prices.price_as_of(security_id, as_of) {
            Some(quote) => {
                let amount = MonetaryAmount::new(quote.price, quote.currency);
                self.rates.convert(&amount, base, as_of)?.value
            }
            None => {
                warn!(
                    "No price for {} as of {}; valuing holding at zero",
                    security_id, as_of
                );
                Decimal::ZERO
            }
        };

        let market_value = shares_held * price;
        let unrealized_gain = market_value - total_cost_basis;

        // Realized amounts convert at their own close dates.
        let mut realized_gain = Decimal::ZERO;
        let mut realized_basis = Decimal::ZERO;
        for record in &outcome.realized {
            realized_gain += self
                .rates
                .convert(&record.gain(), base, record.close_date)?
                .value;
            realized_basis += self
                .rates
                .convert(&record.cost_basis, base, record.close_date)?
                .value;
        }
        for income in &outcome.income_events {
            let amount = MonetaryAmount::new(income.amount, account_currency);
            realized_gain += self.rates.convert(&amount, base, income.date)?.value;
        }

        let total_gain = unrealized_gain + realized_gain;

        // Aggregate acquisition basis: still-open basis plus the basis of
        // everything already disposed.
        let acquisition_basis = total_cost_basis + realized_basis;
        let total_gain_percentage = if acquisition_basis.is_zero() {
            None
        } else {
            Some(total_gain / acquisition_basis)
        };

        let irr = self.solve_irr(account_currency, as_of, events, market_value)?;

        Ok(SecurityPerformance {
            security_id: security_id.to_string(),
            account_id: account_id.to_string(),
            base_currency: base.to_string(),
            shares_held,
            cost_basis_per_share,
            total_cost_basis,
            price,
            market_value,
            unrealized_gain,
            realized_gain,
            total_gain,
            total_gain_percentage,
            irr,
            short_position: outcome.short_position,
        })
    }

    /// Builds the base-currency cash-flow series and solves for IRR.
    ///
    /// Purchases are negative flows at their trade dates, sale and
    /// distribution proceeds positive at theirs, and the current market
    /// value enters as a final synthetic positive flow at the report date.
    fn solve_irr(
        &self,
        account_currency: &str,
        as_of: NaiveDate,
        events: &[InvestmentEvent],
        market_value: Decimal,
    ) -> Result<Option<f64>> {
        let base = self.base_currency.as_str();
        let mut flows: Vec<CashFlow> = Vec::with_capacity(events.len() + 1);

        for event in events {
            let amount = match &event.kind {
                InvestmentEventKind::Buy {
                    quantity,
                    unit_price,
                    fees,
                } => -(quantity * unit_price + fees),
                InvestmentEventKind::Sell {
                    quantity,
                    unit_price,
                    fees,
                } => quantity * unit_price - fees,
                InvestmentEventKind::Dividend { amount }
                | InvestmentEventKind::ReturnOfCapital { amount } => *amount,
            };
            if amount.is_zero() {
                continue;
            }
            let in_base = self
                .rates
                .convert(&MonetaryAmount::new(amount, account_currency), base, event.date)?
                .value;
            flows.push(CashFlow {
                date: event.date,
                amount: in_base.to_f64().unwrap_or(0.0),
            });
        }

        if !market_value.is_zero() {
            flows.push(CashFlow {
                date: as_of,
                amount: market_value.to_f64().unwrap_or(0.0),
            });
        }

        flows.sort_by_key(|f| f.date);
        Ok(internal_rate_of_return(&flows))
    }
}
