//! Internal rate of return over an irregular dated cash-flow series.
//!
//! Solves for the periodic rate `r` with
//! `NPV(r) = sum(flow_i / (1+r)^((date_i - date_0)/365)) = 0`
//! by Newton-Raphson, falling back to bisection when the iteration
//! degenerates. IRR is mathematically unsolvable for a series without a sign
//! change; that case, too few flows, and non-convergence all return `None` -
//! an explicit reportable state, never a crash or a silent zero.

use chrono::NaiveDate;

use crate::constants::{DAYS_PER_YEAR, IRR_MAX_ITERATIONS, IRR_TOLERANCE};

/// One dated cash flow: purchases negative, proceeds and the final market
/// value positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Periods (in years) from the series start, for each flow.
fn periods(flows: &[CashFlow]) -> Vec<f64> {
    let start = flows[0].date;
    flows
        .iter()
        .map(|f| (f.date - start).num_days() as f64 / DAYS_PER_YEAR)
        .collect()
}

fn npv(flows: &[CashFlow], periods: &[f64], rate: f64) -> f64 {
    flows
        .iter()
        .zip(periods)
        .map(|(flow, t)| flow.amount / (1.0 + rate).powf(*t))
        .sum()
}

fn npv_derivative(flows: &[CashFlow], periods: &[f64], rate: f64) -> f64 {
    flows
        .iter()
        .zip(periods)
        .map(|(flow, t)| -t * flow.amount / (1.0 + rate).powf(t + 1.0))
        .sum()
}

/// Solves for the IRR of a chronological cash-flow series.
pub fn internal_rate_of_return(flows: &[CashFlow]) -> Option<f64> {
    if flows.len() < 2 {
        return None;
    }
    let has_positive = flows.iter().any(|f| f.amount > 0.0);
    let has_negative = flows.iter().any(|f| f.amount < 0.0);
    if !has_positive || !has_negative {
        return None;
    }

    let periods = periods(flows);

    // Newton-Raphson from a conventional starting guess.
    let mut rate = 0.1_f64;
    for _ in 0..IRR_MAX_ITERATIONS {
        if 1.0 + rate <= 0.0 {
            break;
        }
        let value = npv(flows, &periods, rate);
        if value.abs() < IRR_TOLERANCE {
            return Some(rate);
        }
        let derivative = npv_derivative(flows, &periods, rate);
        if derivative == 0.0 || !derivative.is_finite() {
            break;
        }
        let next = rate - value / derivative;
        if !next.is_finite() {
            break;
        }
        rate = next;
    }
    if 1.0 + rate > 0.0 {
        let value = npv(flows, &periods, rate);
        if value.is_finite() && value.abs() < IRR_TOLERANCE {
            return Some(rate);
        }
    }

    bisect(flows, &periods)
}

/// Bisection fallback over an expanding bracket.
fn bisect(flows: &[CashFlow], periods: &[f64]) -> Option<f64> {
    let mut lo = -0.999_999;
    let mut hi = 10.0;
    let mut f_lo = npv(flows, periods, lo);
    let mut f_hi = npv(flows, periods, hi);

    // Expand the upper bound until the bracket straddles a root.
    let mut expansions = 0;
    while f_lo.signum() == f_hi.signum() && expansions < 32 {
        hi *= 2.0;
        f_hi = npv(flows, periods, hi);
        expansions += 1;
    }
    if !f_lo.is_finite() || !f_hi.is_finite() || f_lo.signum() == f_hi.signum() {
        return None;
    }

    for _ in 0..200 {
        let mid = (lo + hi) / 2.0;
        let f_mid = npv(flows, periods, mid);
        if f_mid.abs() < IRR_TOLERANCE || (hi - lo) < IRR_TOLERANCE {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flow(date: NaiveDate, amount: f64) -> CashFlow {
        CashFlow { date, amount }
    }

    #[test]
    fn test_one_year_ten_percent() {
        // Buy 100 at T0, sell 110 exactly 365 days later.
        let flows = vec![
            flow(ymd(2023, 1, 1), -100.0),
            flow(ymd(2024, 1, 1), 110.0),
        ];
        let irr = internal_rate_of_return(&flows).unwrap();
        assert!((irr - 0.10).abs() < 1e-6, "irr was {irr}");
    }

    #[test]
    fn test_negative_return() {
        let flows = vec![
            flow(ymd(2023, 1, 1), -100.0),
            flow(ymd(2024, 1, 1), 80.0),
        ];
        let irr = internal_rate_of_return(&flows).unwrap();
        assert!((irr + 0.20).abs() < 1e-6, "irr was {irr}");
    }

    #[test]
    fn test_multi_flow_series() {
        // Two purchases, a dividend, and a final valuation.
        let flows = vec![
            flow(ymd(2022, 1, 1), -1000.0),
            flow(ymd(2022, 7, 1), -500.0),
            flow(ymd(2023, 1, 1), 50.0),
            flow(ymd(2024, 1, 1), 1800.0),
        ];
        let irr = internal_rate_of_return(&flows).unwrap();
        // NPV at the solution must be ~zero.
        let periods = super::periods(&flows);
        assert!(npv(&flows, &periods, irr).abs() < 1e-6);
        assert!(irr > 0.0);
    }

    #[test]
    fn test_fewer_than_two_flows_is_undefined() {
        assert_eq!(internal_rate_of_return(&[]), None);
        assert_eq!(
            internal_rate_of_return(&[flow(ymd(2023, 1, 1), -100.0)]),
            None
        );
    }

    #[test]
    fn test_no_sign_change_is_undefined() {
        // Funded twice, never sold, currently worthless: all flows negative.
        let flows = vec![
            flow(ymd(2023, 1, 1), -100.0),
            flow(ymd(2023, 6, 1), -50.0),
        ];
        assert_eq!(internal_rate_of_return(&flows), None);

        let all_positive = vec![
            flow(ymd(2023, 1, 1), 100.0),
            flow(ymd(2023, 6, 1), 50.0),
        ];
        assert_eq!(internal_rate_of_return(&all_positive), None);
    }

    #[test]
    fn test_steep_loss_converges_via_bisection() {
        // Near-total loss pushes Newton toward the 1+r <= 0 wall.
        let flows = vec![
            flow(ymd(2023, 1, 1), -1000.0),
            flow(ymd(2024, 1, 1), 1.0),
        ];
        let irr = internal_rate_of_return(&flows).unwrap();
        // Root of -1000 + 1/(1+r) is r = -0.999.
        assert!((irr + 0.999).abs() < 1e-5, "irr was {irr}");
    }

    #[test]
    fn test_same_day_flows() {
        // Zero elapsed time for the second flow; exponent is zero.
        let flows = vec![
            flow(ymd(2023, 1, 1), -100.0),
            flow(ymd(2023, 1, 1), 50.0),
            flow(ymd(2024, 1, 1), 60.0),
        ];
        let irr = internal_rate_of_return(&flows).unwrap();
        let periods = super::periods(&flows);
        assert!(npv(&flows, &periods, irr).abs() < 1e-6);
    }
}
