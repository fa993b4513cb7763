/// Quantity threshold below which a share position is considered closed.
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Decimal precision for performance calculations.
pub const DECIMAL_PRECISION: u32 = 6;

/// Convergence tolerance for the IRR solver.
pub const IRR_TOLERANCE: f64 = 1e-7;

/// Maximum Newton-Raphson iterations before the solver gives up.
pub const IRR_MAX_ITERATIONS: u32 = 100;

/// Day-count denominator for IRR period exponents.
pub const DAYS_PER_YEAR: f64 = 365.0;
