use std::path::PathBuf;

use rust_decimal::Decimal;
use tax_core::{BracketTableError, FilingStatus, StateCode, TaxYearConfigError};
use thiserror::Error;

/// Errors raised while loading reference data.
///
/// Every variant names the file, schedule or state it came from so an
/// operator can find the bad row.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("TOML parse error in {file}: {message}")]
    TomlParse { file: &'static str, message: String },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("No federal brackets for {status} in tax year {tax_year}")]
    MissingSchedule {
        status: FilingStatus,
        tax_year: i32,
    },

    #[error("Federal schedule for {status} in tax year {tax_year}: {source}")]
    FederalSchedule {
        status: FilingStatus,
        tax_year: i32,
        #[source]
        source: BracketTableError,
    },

    #[error("Unknown state code '{0}'")]
    UnknownState(String),

    #[error("State {state}: {source}")]
    StateRegime {
        state: StateCode,
        #[source]
        source: BracketTableError,
    },

    #[error("State {state}: {field} must be between 0 and 1, got {value}")]
    StateRate {
        state: StateCode,
        field: &'static str,
        value: Decimal,
    },

    #[error("State {state}: standard deduction cannot be negative, got {value}")]
    NegativeDeduction { state: StateCode, value: Decimal },

    #[error("State {state}: credit '{id}' cannot be negative, got {value}")]
    NegativeCredit {
        state: StateCode,
        id: String,
        value: Decimal,
    },

    #[error("Invalid tax year configuration: {0}")]
    Config(#[from] TaxYearConfigError),

    #[error("{file} is for tax year {found}, expected {expected}")]
    TaxYearMismatch {
        file: &'static str,
        expected: i32,
        found: i32,
    },
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::CsvParse(err.to_string())
    }
}
