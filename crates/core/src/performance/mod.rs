//! Performance module - per-security metrics, IRR, and CSV export.

mod export;
mod irr;
mod performance_model;
mod performance_service;
mod performance_traits;

pub use export::{performance_csv_string, write_performance_csv};
pub use irr::{internal_rate_of_return, CashFlow};
pub use performance_model::SecurityPerformance;
pub use performance_service::PerformanceService;
pub use performance_traits::{PriceProviderTrait, SecurityPrice};

#[cfg(test)]
mod performance_service_tests;
