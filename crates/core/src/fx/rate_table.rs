use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::fx::fx_errors::FxError;
use crate::fx::fx_model::ExchangeRate;
use crate::money::MonetaryAmount;

/// Historical exchange-rate table with graph-based conversion.
///
/// Rates are stored as independent time series per currency pair and paths
/// are calculated on demand, so a USD->EUR quote plus a EUR->CHF quote is
/// enough to convert USD->CHF. Lookups match the nearest quoted date on
/// either side of the requested date.
pub struct RateTable {
    /// Graph adjacency list: currency -> set of directly quoted currencies.
    adj: HashMap<String, HashSet<String>>,

    /// Per-pair rate history. BTreeMap gives O(log n) nearest-date lookup.
    rates: HashMap<(String, String), BTreeMap<NaiveDate, Decimal>>,
}

impl RateTable {
    pub fn new(exchange_rates: Vec<ExchangeRate>) -> Self {
        let mut table = RateTable {
            adj: HashMap::new(),
            rates: HashMap::new(),
        };
        table.add_rates(exchange_rates);
        table
    }

    pub fn empty() -> Self {
        RateTable {
            adj: HashMap::new(),
            rates: HashMap::new(),
        }
    }

    /// Adds historical rates. O(1) per rate; inverses are derived
    /// automatically so either quote direction connects the pair.
    pub fn add_rates(&mut self, rates: Vec<ExchangeRate>) {
        for rate in rates {
            if rate.from_currency == rate.to_currency {
                continue;
            }

            let forward_pair = (rate.from_currency.clone(), rate.to_currency.clone());
            let inverse_pair = (rate.to_currency.clone(), rate.from_currency.clone());

            self.rates
                .entry(forward_pair)
                .or_default()
                .insert(rate.date, rate.rate);
            self.adj
                .entry(rate.from_currency.clone())
                .or_default()
                .insert(rate.to_currency.clone());

            if !rate.rate.is_zero() {
                let inverse_rate = Decimal::ONE / rate.rate;
                self.rates
                    .entry(inverse_pair)
                    .or_default()
                    .insert(rate.date, inverse_rate);
                self.adj
                    .entry(rate.to_currency)
                    .or_default()
                    .insert(rate.from_currency);
            }
        }
    }

    /// Finds the direct rate between two quoted currencies.
    ///
    /// Picks the closest quote on or before the date, or the closest quote
    /// after it, whichever is nearer in days.
    fn get_direct_rate(&self, from: &str, to: &str, date: NaiveDate) -> Option<Decimal> {
        let key = (from.to_string(), to.to_string());
        let history = self.rates.get(&key)?;

        let prev = history.range(..=date).next_back();
        let next = history.range(date..).next();

        match (prev, next) {
            (Some((d1, r1)), Some((d2, r2))) => {
                if d1 == d2 {
                    return Some(*r1);
                }
                let dist_prev = (date - *d1).num_days().abs();
                let dist_next = (*d2 - date).num_days().abs();
                if dist_prev <= dist_next {
                    Some(*r1)
                } else {
                    Some(*r2)
                }
            }
            (Some((_, r)), None) => Some(*r),
            (None, Some((_, r))) => Some(*r),
            (None, None) => None,
        }
    }

    /// Returns the conversion rate effective on `date`, following the
    /// shortest quoted path (BFS) between the two currencies.
    pub fn rate_on(&self, from: &str, to: &str, date: NaiveDate) -> Result<Decimal, FxError> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        let mut queue: VecDeque<(String, Decimal)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();

        queue.push_back((from.to_string(), Decimal::ONE));
        visited.insert(from.to_string());

        while let Some((current, accumulated)) = queue.pop_front() {
            if current == to {
                return Ok(accumulated);
            }

            if let Some(neighbors) = self.adj.get(&current) {
                for neighbor in neighbors {
                    if !visited.contains(neighbor) {
                        if let Some(rate) = self.get_direct_rate(&current, neighbor, date) {
                            visited.insert(neighbor.clone());
                            queue.push_back((neighbor.clone(), accumulated * rate));
                        }
                    }
                }
            }
        }

        Err(FxError::RateNotFound(format!(
            "No conversion path found for {} -> {} on or near {}",
            from, to, date
        )))
    }

    /// Converts an amount to `to_currency` at the rate effective on `date`.
    pub fn convert(
        &self,
        amount: &MonetaryAmount,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<MonetaryAmount, FxError> {
        if amount.currency == to_currency {
            return Ok(amount.clone());
        }
        let rate = self.rate_on(&amount.currency, to_currency, date)?;
        Ok(amount.converted(to_currency, rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_rate(from: &str, to: &str, rate: Decimal, y: i32, m: u32, d: u32) -> ExchangeRate {
        ExchangeRate::new(from, to, rate, ymd(y, m, d))
    }

    #[test]
    fn test_exact_date_match() {
        let table = RateTable::new(vec![make_rate("USD", "EUR", dec!(0.90), 2023, 10, 25)]);
        let rate = table.rate_on("USD", "EUR", ymd(2023, 10, 25)).unwrap();
        assert_eq!(rate, dec!(0.90));
    }

    #[test]
    fn test_nearest_future_is_closer() {
        // Target: 2023-10-27. 10-20 is 7 days past, 10-30 is 3 days future.
        let table = RateTable::new(vec![
            make_rate("GBP", "GBX", dec!(100), 2023, 10, 20),
            make_rate("GBP", "GBX", dec!(101), 2023, 10, 30),
        ]);
        let rate = table.rate_on("GBP", "GBX", ymd(2023, 10, 27)).unwrap();
        assert_eq!(rate, dec!(101));
    }

    #[test]
    fn test_nearest_past_is_closer() {
        let table = RateTable::new(vec![
            make_rate("GBP", "GBX", dec!(100), 2023, 10, 20),
            make_rate("GBP", "GBX", dec!(101), 2023, 10, 30),
        ]);
        let rate = table.rate_on("GBP", "GBX", ymd(2023, 10, 22)).unwrap();
        assert_eq!(rate, dec!(100));
    }

    #[test]
    fn test_single_static_rate_works_anywhere() {
        let table = RateTable::new(vec![make_rate("GBP", "GBX", dec!(100), 2023, 6, 15)]);
        assert_eq!(
            table.rate_on("GBP", "GBX", ymd(2000, 1, 1)).unwrap(),
            dec!(100)
        );
        assert_eq!(
            table.rate_on("GBP", "GBX", ymd(2050, 1, 1)).unwrap(),
            dec!(100)
        );
    }

    #[test]
    fn test_inverse_rate_is_derived() {
        let table = RateTable::new(vec![make_rate("USD", "EUR", dec!(0.8), 2024, 1, 2)]);
        let rate = table.rate_on("EUR", "USD", ymd(2024, 1, 2)).unwrap();
        assert_eq!(rate, dec!(1.25));
    }

    #[test]
    fn test_multi_hop_path() {
        let table = RateTable::new(vec![
            make_rate("USD", "EUR", dec!(0.9), 2024, 3, 1),
            make_rate("EUR", "CHF", dec!(0.95), 2024, 3, 1),
        ]);
        let rate = table.rate_on("USD", "CHF", ymd(2024, 3, 1)).unwrap();
        assert_eq!(rate, dec!(0.855));
    }

    #[test]
    fn test_missing_pair_is_an_error() {
        let table = RateTable::empty();
        assert!(table.rate_on("USD", "JPY", ymd(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_convert_amount_historical_vs_current() {
        // Historical rate differs from the latest one; conversion must use
        // the rate effective on the requested date.
        let table = RateTable::new(vec![
            make_rate("USD", "EUR", dec!(0.80), 2023, 1, 1),
            make_rate("USD", "EUR", dec!(0.90), 2024, 1, 1),
        ]);
        let amount = MonetaryAmount::new(dec!(100), "USD");
        let historical = table.convert(&amount, "EUR", ymd(2023, 1, 1)).unwrap();
        let current = table.convert(&amount, "EUR", ymd(2024, 1, 1)).unwrap();
        assert_eq!(historical.value, dec!(80));
        assert_eq!(current.value, dec!(90));
    }
}
