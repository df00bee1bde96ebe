//! Tax calculators.
//!
//! Every calculator is a pure function of its inputs and the reference data it
//! borrows. Results carry unrounded [`Decimal`](rust_decimal::Decimal) values.

pub mod bracket;
pub mod common;
pub mod freelance;
pub mod payroll;
pub mod quarterly;
pub mod safe_harbor;

pub use bracket::{
    BracketSlice, bracket_breakdown, compute_bracket_tax, flat_tax, marginal_rate, progressive_tax,
};
pub use freelance::{FreelanceCalculator, FreelanceInputs, FreelanceResult};
pub use payroll::{DEFAULT_PAY_PERIODS, PayrollCalculator, PayrollResult};
pub use quarterly::{QuarterlyEstimator, QuarterlyInstallment, QuarterlyResult};
pub use safe_harbor::{SafeHarborEvaluation, SafeHarborRule};
