//! CSV loader for batch income profiles.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does **not** matter. Header
//! names are case-sensitive.
//!
//! | Column                     | Required | Type    | Notes                                      |
//! |----------------------------|----------|---------|--------------------------------------------|
//! | `wages`                    | yes      | decimal | e.g. `75000.00`                            |
//! | `filing_status`            | yes      | string  | `S`, `MFJ` or `HOH` (or `single`, ...)     |
//! | `state`                    | yes      | string  | Two-letter postal code                     |
//! | `bonus`                    | no       | decimal | Empty cell is zero                         |
//! | `self_employment_gross`    | no       | decimal | Empty cell is zero                         |
//! | `business_expenses`        | no       | decimal | Empty cell is zero                         |
//! | `retirement_contribution`  | no       | decimal | Absolute amount                            |
//! | `retirement_percent`       | no       | decimal | Percent of wages; excludes the column above |
//! | `health_insurance_premium` | no       | decimal | Empty cell is zero                         |
//! | `credits`                  | no       | string  | State credit ids separated by `;`          |
//! | `prior_year_tax`           | no       | decimal | Safe-harbor input; empty cell is zero      |
//! | `prior_year_agi`           | no       | decimal | Safe-harbor input; empty cell is zero      |
//!
//! ### Minimal example
//!
//! ```csv
//! wages,filing_status,state
//! 85000.00,S,CA
//! ```
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{FilingStatus, IncomeProfile, SafeHarborInputs, StateCode};

use crate::app::retirement_amount;

// ---------------------------------------------------------------------------
// Serde-compatible row that mirrors the CSV layout exactly
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    wages: Decimal,
    filing_status: String,
    state: String,
    #[serde(default)]
    bonus: Option<Decimal>,
    #[serde(default)]
    self_employment_gross: Option<Decimal>,
    #[serde(default)]
    business_expenses: Option<Decimal>,
    #[serde(default)]
    retirement_contribution: Option<Decimal>,
    #[serde(default)]
    retirement_percent: Option<Decimal>,
    #[serde(default)]
    health_insurance_premium: Option<Decimal>,
    #[serde(default)]
    credits: Option<String>,
    #[serde(default)]
    prior_year_tax: Option<Decimal>,
    #[serde(default)]
    prior_year_agi: Option<Decimal>,
}

/// One data row: the income profile plus last year's figures for the
/// quarterly estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProfile {
    pub profile: IncomeProfile,
    pub prior_year: SafeHarborInputs,
}

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or converting CSV data.
///
/// Row numbers are 1-based and count data rows only (the header is row 0).
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bad structure, missing required column, type mismatch, etc.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("unrecognised filing status '{status}' on row {row}")]
    InvalidFilingStatus { status: String, row: usize },

    #[error("unrecognised state code '{state}' on row {row}")]
    InvalidState { state: String, row: usize },

    #[error("row {row} sets both retirement_contribution and retirement_percent")]
    ConflictingRetirement { row: usize },
}

// ---------------------------------------------------------------------------
// Core loader
// ---------------------------------------------------------------------------

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<BatchProfile, CsvLoadError> {
    let filing_status = FilingStatus::parse(&row.filing_status).ok_or_else(|| {
        CsvLoadError::InvalidFilingStatus {
            status: row.filing_status.clone(),
            row: row_number,
        }
    })?;

    let state = StateCode::parse(&row.state).ok_or_else(|| CsvLoadError::InvalidState {
        state: row.state.clone(),
        row: row_number,
    })?;

    if row.retirement_contribution.is_some() && row.retirement_percent.is_some() {
        return Err(CsvLoadError::ConflictingRetirement { row: row_number });
    }

    let selected_credits = row
        .credits
        .as_deref()
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect();

    let profile = IncomeProfile {
        wages: row.wages,
        bonus: row.bonus.unwrap_or_default(),
        self_employment_gross: row.self_employment_gross.unwrap_or_default(),
        business_expenses: row.business_expenses.unwrap_or_default(),
        retirement_contribution: retirement_amount(
            row.wages,
            row.retirement_contribution,
            row.retirement_percent,
        ),
        health_insurance_premium: row.health_insurance_premium.unwrap_or_default(),
        filing_status,
        state,
        selected_credits,
    };

    Ok(BatchProfile {
        profile,
        prior_year: SafeHarborInputs {
            prior_year_tax: row.prior_year_tax.unwrap_or_default(),
            prior_year_agi: row.prior_year_agi.unwrap_or_default(),
        },
    })
}

/// Parse CSV text and return one [`BatchProfile`] per data row, in file
/// order.
///
/// # Errors
///
/// * [`CsvLoadError::Parse`] if the CSV is structurally invalid or a field
///   cannot be deserialised.
/// * [`CsvLoadError::InvalidFilingStatus`] or [`CsvLoadError::InvalidState`]
///   for unrecognised codes.
/// * [`CsvLoadError::ConflictingRetirement`] when a row gives the retirement
///   contribution both ways.
pub fn load_from_str(input: &str) -> Result<Vec<BatchProfile>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<BatchProfile>, CsvLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CsvLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
