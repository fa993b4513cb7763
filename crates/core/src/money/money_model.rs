//! Monetary amount domain model.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// An arbitrary-precision decimal value tagged with a currency code.
///
/// Immutable value type. Arithmetic between two amounts of different
/// currencies is rejected; crossing currencies requires an explicit
/// conversion step with an externally supplied rate. Same-currency
/// arithmetic is exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryAmount {
    pub value: Decimal,
    pub currency: String,
}

impl MonetaryAmount {
    pub fn new(value: Decimal, currency: impl Into<String>) -> Self {
        MonetaryAmount {
            value,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        MonetaryAmount {
            value: Decimal::ZERO,
            currency: currency.into(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Rejects the other operand when its currency differs from ours.
    fn check_currency(&self, other: &MonetaryAmount) -> Result<()> {
        if self.currency != other.currency {
            return Err(Error::CurrencyMismatch {
                expected: self.currency.clone(),
                actual: other.currency.clone(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &MonetaryAmount) -> Result<MonetaryAmount> {
        self.check_currency(other)?;
        Ok(MonetaryAmount::new(
            self.value + other.value,
            self.currency.clone(),
        ))
    }

    pub fn checked_sub(&self, other: &MonetaryAmount) -> Result<MonetaryAmount> {
        self.check_currency(other)?;
        Ok(MonetaryAmount::new(
            self.value - other.value,
            self.currency.clone(),
        ))
    }

    /// Scalar multiply, e.g. unit cost basis times a share quantity.
    pub fn scaled_by(&self, factor: Decimal) -> MonetaryAmount {
        MonetaryAmount::new(self.value * factor, self.currency.clone())
    }

    pub fn abs(&self) -> MonetaryAmount {
        MonetaryAmount::new(self.value.abs(), self.currency.clone())
    }

    pub fn neg(&self) -> MonetaryAmount {
        MonetaryAmount::new(-self.value, self.currency.clone())
    }

    /// Explicit currency conversion with an externally supplied rate.
    ///
    /// This is the only way an amount crosses currencies; callers obtain the
    /// rate from the fx rate table for the relevant historical date.
    pub fn converted(&self, to_currency: impl Into<String>, rate: Decimal) -> MonetaryAmount {
        let to_currency = to_currency.into();
        if to_currency == self.currency {
            return self.clone();
        }
        MonetaryAmount::new(self.value * rate, to_currency)
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}
