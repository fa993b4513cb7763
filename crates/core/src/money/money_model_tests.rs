use rust_decimal_macros::dec;

use crate::errors::Error;
use crate::money::MonetaryAmount;

#[test]
fn test_same_currency_arithmetic_is_exact() {
    let a = MonetaryAmount::new(dec!(0.1), "USD");
    let b = MonetaryAmount::new(dec!(0.2), "USD");
    let sum = a.checked_add(&b).unwrap();
    assert_eq!(sum.value, dec!(0.3));
    assert_eq!(sum.currency, "USD");
}

#[test]
fn test_cross_currency_addition_is_rejected() {
    let usd = MonetaryAmount::new(dec!(100), "USD");
    let eur = MonetaryAmount::new(dec!(100), "EUR");
    let err = usd.checked_add(&eur).unwrap_err();
    match err {
        Error::CurrencyMismatch { expected, actual } => {
            assert_eq!(expected, "USD");
            assert_eq!(actual, "EUR");
        }
        other => panic!("expected CurrencyMismatch, got {other:?}"),
    }
}

#[test]
fn test_cross_currency_subtraction_is_rejected() {
    let usd = MonetaryAmount::new(dec!(100), "USD");
    let eur = MonetaryAmount::new(dec!(1), "EUR");
    assert!(usd.checked_sub(&eur).is_err());
}

#[test]
fn test_explicit_conversion_applies_rate() {
    let usd = MonetaryAmount::new(dec!(100), "USD");
    let eur = usd.converted("EUR", dec!(0.9));
    assert_eq!(eur.value, dec!(90));
    assert_eq!(eur.currency, "EUR");
}

#[test]
fn test_conversion_to_same_currency_is_identity() {
    let usd = MonetaryAmount::new(dec!(42.42), "USD");
    // Rate is ignored when no conversion is needed.
    let same = usd.converted("USD", dec!(2));
    assert_eq!(same, usd);
}

#[test]
fn test_scaled_by_keeps_currency() {
    let unit_cost = MonetaryAmount::new(dec!(12.50), "CAD");
    let basis = unit_cost.scaled_by(dec!(8));
    assert_eq!(basis.value, dec!(100));
    assert_eq!(basis.currency, "CAD");
}

#[test]
fn test_display_renders_plain_decimal() {
    let m = MonetaryAmount::new(dec!(1234.56), "USD");
    assert_eq!(m.to_string(), "1234.56 USD");
}
