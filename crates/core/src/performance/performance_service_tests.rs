use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

use crate::accounts::{Account, AccountKind};
use crate::fx::{ExchangeRate, RateTable};
use crate::ledger::{
    InvestmentDetails, InvestmentKind, Ledger, TransactionDraft, TransactionEntryDraft,
    TransactionKind,
};
use crate::lots::{LotMatcher, RocPolicy, ShortSalePolicy};
use crate::money::MonetaryAmount;
use crate::performance::{PerformanceService, PriceProviderTrait, SecurityPrice};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fixed price book keyed by security id.
struct StaticPrices(HashMap<String, (Decimal, String)>);

impl StaticPrices {
    fn new(prices: &[(&str, Decimal, &str)]) -> Arc<Self> {
        Arc::new(StaticPrices(
            prices
                .iter()
                .map(|(id, price, currency)| {
                    (id.to_string(), (*price, currency.to_string()))
                })
                .collect(),
        ))
    }
}

impl PriceProviderTrait for StaticPrices {
    fn price_as_of(&self, security_id: &str, date: NaiveDate) -> Option<SecurityPrice> {
        self.0.get(security_id).map(|(price, currency)| SecurityPrice {
            security_id: security_id.to_string(),
            date,
            price: *price,
            currency: currency.clone(),
        })
    }
}

fn usd_ledger() -> Ledger {
    let ledger = Ledger::new();
    ledger
        .upsert_account(Account::new("brokerage", "Brokerage", "USD", AccountKind::Investment))
        .unwrap();
    ledger
        .upsert_account(Account::new("bank", "Bank", "USD", AccountKind::Bank))
        .unwrap();
    ledger
}

fn trade(
    ledger: &Ledger,
    kind: InvestmentKind,
    date: NaiveDate,
    security: &str,
    quantity: Decimal,
    unit_price: Decimal,
    cash: Decimal,
    currency: &str,
    investment_account: &str,
    cash_account: &str,
) {
    let draft = TransactionDraft::new(TransactionKind::Investment(kind), date)
        .with_entry(TransactionEntryDraft::balanced(
            investment_account,
            cash_account,
            MonetaryAmount::new(cash, currency),
        ))
        .with_investment(InvestmentDetails {
            security_id: security.to_string(),
            account_id: investment_account.to_string(),
            quantity,
            unit_price,
            fees: Decimal::ZERO,
        });
    ledger.create_transaction(draft).unwrap();
}

fn usd_trade(
    ledger: &Ledger,
    kind: InvestmentKind,
    date: NaiveDate,
    security: &str,
    quantity: Decimal,
    unit_price: Decimal,
    cash: Decimal,
) {
    trade(
        ledger, kind, date, security, quantity, unit_price, cash, "USD", "brokerage", "bank",
    );
}

#[test]
fn test_open_position_metrics() {
    let ledger = usd_ledger();
    usd_trade(
        &ledger,
        InvestmentKind::Buy,
        ymd(2024, 1, 2),
        "ACME",
        dec!(10),
        dec!(100),
        dec!(1000),
    );

    let service = PerformanceService::new(
        StaticPrices::new(&[("ACME", dec!(120), "USD")]),
        RateTable::empty(),
        "USD",
    );
    let summary = service
        .compute_performance_summary(&ledger, "brokerage", ymd(2024, 6, 1))
        .unwrap();

    assert_eq!(summary.len(), 1);
    let datum = &summary[0];
    assert_eq!(datum.shares_held, dec!(10));
    assert_eq!(datum.total_cost_basis, dec!(1000));
    assert_eq!(datum.cost_basis_per_share, Some(dec!(100)));
    assert_eq!(datum.price, dec!(120));
    assert_eq!(datum.market_value, dec!(1200));
    assert_eq!(datum.unrealized_gain, dec!(200));
    assert_eq!(datum.realized_gain, Decimal::ZERO);
    assert_eq!(datum.total_gain, dec!(200));
    assert_eq!(datum.total_gain_percentage, Some(dec!(0.2)));
    assert!(!datum.short_position);
    // Bought and appreciated; the rate must be positive and solvable.
    assert!(datum.irr.unwrap() > 0.0);
}

#[test]
fn test_realized_gain_converts_at_close_date_not_report_date() {
    let ledger = Ledger::new();
    ledger
        .upsert_account(Account::new("brokerage-eu", "EU Brokerage", "EUR", AccountKind::Investment))
        .unwrap();
    ledger
        .upsert_account(Account::new("bank-eu", "EU Bank", "EUR", AccountKind::Bank))
        .unwrap();

    trade(
        &ledger,
        InvestmentKind::Buy,
        ymd(2024, 1, 10),
        "SAP",
        dec!(10),
        dec!(100),
        dec!(1000),
        "EUR",
        "brokerage-eu",
        "bank-eu",
    );
    trade(
        &ledger,
        InvestmentKind::Sell,
        ymd(2024, 2, 10),
        "SAP",
        dec!(10),
        dec!(110),
        dec!(1100),
        "EUR",
        "brokerage-eu",
        "bank-eu",
    );

    // EUR/USD moves from 1.2 at the sale to 1.5 at the report date.
    let rates = RateTable::new(vec![
        ExchangeRate::new("EUR", "USD", dec!(1.2), ymd(2024, 2, 10)),
        ExchangeRate::new("EUR", "USD", dec!(1.5), ymd(2024, 6, 1)),
    ]);
    let service = PerformanceService::new(StaticPrices::new(&[]), rates, "USD");
    let summary = service
        .compute_performance_summary(&ledger, "brokerage-eu", ymd(2024, 6, 1))
        .unwrap();

    let datum = &summary[0];
    // 100 EUR gain at the close-date rate of 1.2, not the report-date 1.5.
    assert_eq!(datum.realized_gain, dec!(120));
    // Position fully closed: sentinels, zero holdings.
    assert_eq!(datum.shares_held, Decimal::ZERO);
    assert_eq!(datum.cost_basis_per_share, None);
    assert_eq!(datum.total_cost_basis, Decimal::ZERO);
    assert_eq!(datum.market_value, Decimal::ZERO);
    // Gain over the disposed basis (1000 EUR at the close-date rate).
    assert_eq!(datum.total_gain_percentage, Some(dec!(0.1)));
}

#[test]
fn test_irr_ten_percent_round_trip() {
    let ledger = usd_ledger();
    usd_trade(
        &ledger,
        InvestmentKind::Buy,
        ymd(2023, 1, 1),
        "ACME",
        dec!(1),
        dec!(100),
        dec!(100),
    );
    usd_trade(
        &ledger,
        InvestmentKind::Sell,
        ymd(2024, 1, 1),
        "ACME",
        dec!(1),
        dec!(110),
        dec!(110),
    );

    let service =
        PerformanceService::new(StaticPrices::new(&[]), RateTable::empty(), "USD");
    let summary = service
        .compute_performance_summary(&ledger, "brokerage", ymd(2024, 1, 1))
        .unwrap();

    let irr = summary[0].irr.unwrap();
    assert!((irr - 0.10).abs() < 1e-6, "irr was {irr}");
}

#[test]
fn test_never_sold_and_worthless_has_undefined_irr() {
    let ledger = usd_ledger();
    usd_trade(
        &ledger,
        InvestmentKind::Buy,
        ymd(2023, 1, 1),
        "DUD",
        dec!(10),
        dec!(10),
        dec!(100),
    );

    // No price available: market value zero, so the flow series is a single
    // negative flow with no sign change.
    let service =
        PerformanceService::new(StaticPrices::new(&[]), RateTable::empty(), "USD");
    let summary = service
        .compute_performance_summary(&ledger, "brokerage", ymd(2024, 1, 1))
        .unwrap();

    let datum = &summary[0];
    assert_eq!(datum.price, Decimal::ZERO);
    assert_eq!(datum.market_value, Decimal::ZERO);
    assert_eq!(datum.irr, None);
}

#[test]
fn test_dividend_contributes_to_realized_gain() {
    let ledger = usd_ledger();
    usd_trade(
        &ledger,
        InvestmentKind::Buy,
        ymd(2024, 1, 2),
        "ACME",
        dec!(10),
        dec!(100),
        dec!(1000),
    );
    usd_trade(
        &ledger,
        InvestmentKind::Dividend,
        ymd(2024, 3, 1),
        "ACME",
        Decimal::ZERO,
        Decimal::ZERO,
        dec!(25),
    );

    let service = PerformanceService::new(
        StaticPrices::new(&[("ACME", dec!(100), "USD")]),
        RateTable::empty(),
        "USD",
    );
    let summary = service
        .compute_performance_summary(&ledger, "brokerage", ymd(2024, 6, 1))
        .unwrap();

    let datum = &summary[0];
    assert_eq!(datum.unrealized_gain, Decimal::ZERO);
    assert_eq!(datum.realized_gain, dec!(25));
    assert_eq!(datum.total_gain, dec!(25));
}

#[test]
fn test_short_position_reported_not_crashed() {
    let ledger = usd_ledger();
    usd_trade(
        &ledger,
        InvestmentKind::Sell,
        ymd(2024, 1, 2),
        "ACME",
        dec!(50),
        dec!(10),
        dec!(500),
    );

    let service = PerformanceService::new(
        StaticPrices::new(&[("ACME", dec!(10), "USD")]),
        RateTable::empty(),
        "USD",
    )
    .with_matcher(LotMatcher::new(ShortSalePolicy::TrackShort, RocPolicy::default()));
    let summary = service
        .compute_performance_summary(&ledger, "brokerage", ymd(2024, 6, 1))
        .unwrap();

    let datum = &summary[0];
    assert!(datum.short_position);
    assert_eq!(datum.shares_held, dec!(-50));
    assert_eq!(datum.market_value, dec!(-500));
    // Shares are held (short), so the per-share basis is a defined zero; the
    // gain percentage has no acquisition basis and stays undefined.
    assert_eq!(datum.cost_basis_per_share, Some(Decimal::ZERO));
    assert_eq!(datum.total_gain_percentage, None);
}

#[test]
fn test_summary_is_idempotent() {
    let ledger = usd_ledger();
    usd_trade(
        &ledger,
        InvestmentKind::Buy,
        ymd(2024, 1, 2),
        "ACME",
        dec!(10),
        dec!(100),
        dec!(1000),
    );
    usd_trade(
        &ledger,
        InvestmentKind::Sell,
        ymd(2024, 2, 2),
        "ACME",
        dec!(4),
        dec!(110),
        dec!(440),
    );

    let service = PerformanceService::new(
        StaticPrices::new(&[("ACME", dec!(105), "USD")]),
        RateTable::empty(),
        "USD",
    );
    let first = service
        .compute_performance_summary(&ledger, "brokerage", ymd(2024, 6, 1))
        .unwrap();
    let second = service
        .compute_performance_summary(&ledger, "brokerage", ymd(2024, 6, 1))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_transactions_after_report_date_are_ignored() {
    let ledger = usd_ledger();
    usd_trade(
        &ledger,
        InvestmentKind::Buy,
        ymd(2024, 1, 2),
        "ACME",
        dec!(10),
        dec!(100),
        dec!(1000),
    );
    usd_trade(
        &ledger,
        InvestmentKind::Sell,
        ymd(2024, 7, 1),
        "ACME",
        dec!(10),
        dec!(150),
        dec!(1500),
    );

    let service = PerformanceService::new(
        StaticPrices::new(&[("ACME", dec!(100), "USD")]),
        RateTable::empty(),
        "USD",
    );
    // As of June, the July sale does not exist yet.
    let summary = service
        .compute_performance_summary(&ledger, "brokerage", ymd(2024, 6, 1))
        .unwrap();
    assert_eq!(summary[0].shares_held, dec!(10));
    assert_eq!(summary[0].realized_gain, Decimal::ZERO);
}

#[test]
fn test_cost_basis_per_share_sentinel_when_flat() {
    let ledger = usd_ledger();
    usd_trade(
        &ledger,
        InvestmentKind::Buy,
        ymd(2024, 1, 2),
        "ACME",
        dec!(10),
        dec!(100),
        dec!(1000),
    );
    usd_trade(
        &ledger,
        InvestmentKind::Sell,
        ymd(2024, 2, 2),
        "ACME",
        dec!(10),
        dec!(100),
        dec!(1000),
    );

    let service =
        PerformanceService::new(StaticPrices::new(&[]), RateTable::empty(), "USD");
    let summary = service
        .compute_performance_summary(&ledger, "brokerage", ymd(2024, 6, 1))
        .unwrap();

    let datum = &summary[0];
    assert_eq!(datum.shares_held, Decimal::ZERO);
    assert_eq!(datum.cost_basis_per_share, None);
    assert_eq!(datum.realized_gain, Decimal::ZERO);
    // Round trip at cost: gain is zero but the basis was real, so the
    // percentage is a defined zero.
    assert_eq!(datum.total_gain_percentage, Some(Decimal::ZERO));
}
