//! Monetary amounts - currency-tagged decimal values.

mod money_model;

pub use money_model::MonetaryAmount;

#[cfg(test)]
mod money_model_tests;
