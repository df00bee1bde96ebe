//! Reference data for the tax calculators: federal schedules from CSV, state
//! policies and tax-year constants from TOML.

mod error;
mod federal;
mod states;
mod year;

pub use error::DataError;
pub use federal::{FederalBracketLoader, FederalBracketRecord};
pub use states::{StateTable, StateTableLoader};
pub use year::{
    BUILTIN_TAX_YEAR, FEDERAL_BRACKETS_FILE, STATES_FILE, TAX_YEAR_FILE, TaxYearData,
};
