//! Accounts module - domain models and validation.

mod accounts_model;

pub use accounts_model::{Account, AccountKind};

#[cfg(test)]
mod accounts_model_tests;
