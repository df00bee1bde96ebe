use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{BracketTable, FederalBrackets, FilingStatus, TaxBracket};
use tracing::{debug, warn};

use crate::error::DataError;

/// Maps IRS schedule codes to filing statuses.
///
/// - Schedule X → Single (S)
/// - Schedule Y-1 → Married Filing Jointly (MFJ)
/// - Schedule Y-2 → Married Filing Separately, not modelled (`None`)
/// - Schedule Z → Head of Household (HOH)
fn schedule_to_filing_status(schedule: &str) -> Result<Option<FilingStatus>, DataError> {
    match schedule.trim() {
        "X" => Ok(Some(FilingStatus::Single)),
        "Y-1" => Ok(Some(FilingStatus::MarriedFilingJointly)),
        "Y-2" => Ok(None),
        "Z" => Ok(Some(FilingStatus::HeadOfHousehold)),
        _ => Err(DataError::InvalidSchedule(schedule.to_string())),
    }
}

/// A single record from the federal brackets CSV file.
///
/// - `tax_year`: The tax year (e.g., 2025)
/// - `schedule`: The IRS schedule code (X, Y-1, Y-2, Z)
/// - `upper_bound`: Top of the bracket (empty for the unbounded top bracket)
/// - `rate`: The marginal tax rate as a decimal (e.g., 0.10 for 10%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FederalBracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for federal bracket schedules from CSV.
///
/// Rows may appear in any order and may cover several tax years; [`build`]
/// picks one year and produces validated tables.
///
/// [`build`]: FederalBracketLoader::build
pub struct FederalBracketLoader;

impl FederalBracketLoader {
    /// Parse bracket records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<FederalBracketRecord>, DataError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: FederalBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group `tax_year`'s records by filing status and validate each schedule.
    ///
    /// Within a schedule, brackets are ordered by upper bound with the
    /// unbounded bracket last. Schedules for statuses that are not modelled
    /// are skipped.
    pub fn build(
        records: &[FederalBracketRecord],
        tax_year: i32,
    ) -> Result<FederalBrackets, DataError> {
        let mut groups: BTreeMap<FilingStatus, Vec<TaxBracket>> = BTreeMap::new();

        for record in records.iter().filter(|r| r.tax_year == tax_year) {
            let Some(status) = schedule_to_filing_status(&record.schedule)? else {
                debug!(schedule = %record.schedule, "Skipping schedule for unmodelled filing status");
                continue;
            };
            groups.entry(status).or_default().push(TaxBracket {
                upper_bound: record.upper_bound,
                rate: record.rate,
            });
        }

        let skipped = records.iter().filter(|r| r.tax_year != tax_year).count();
        if skipped > 0 {
            warn!(skipped, tax_year, "Ignoring bracket rows for other tax years");
        }

        let mut table_for = |status: FilingStatus| -> Result<BracketTable, DataError> {
            let mut brackets = groups
                .remove(&status)
                .ok_or(DataError::MissingSchedule { status, tax_year })?;
            // `None` sorts first for Option, so order on (is_unbounded, bound)
            brackets.sort_by_key(|b| (b.upper_bound.is_none(), b.upper_bound));
            BracketTable::try_new(brackets).map_err(|source| DataError::FederalSchedule {
                status,
                tax_year,
                source,
            })
        };

        Ok(FederalBrackets {
            single: table_for(FilingStatus::Single)?,
            married_filing_jointly: table_for(FilingStatus::MarriedFilingJointly)?,
            head_of_household: table_for(FilingStatus::HeadOfHousehold)?,
        })
    }
}
