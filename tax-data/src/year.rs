use std::fs;
use std::path::Path;

use tax_core::{JurisdictionTable, TaxYearConfig};
use tracing::info;

use crate::error::DataError;
use crate::federal::FederalBracketLoader;
use crate::states::StateTableLoader;

pub const FEDERAL_BRACKETS_FILE: &str = "federal_brackets.csv";
pub const STATES_FILE: &str = "states.toml";
pub const TAX_YEAR_FILE: &str = "tax_year.toml";

/// Tax year shipped with the crate.
pub const BUILTIN_TAX_YEAR: i32 = 2025;

const BUILTIN_FEDERAL: &str = include_str!("../data/2025/federal_brackets.csv");
const BUILTIN_STATES: &str = include_str!("../data/2025/states.toml");
const BUILTIN_TAX_YEAR_CONFIG: &str = include_str!("../data/2025/tax_year.toml");

/// Everything the calculators need for one tax year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxYearData {
    pub config: TaxYearConfig,
    pub jurisdictions: JurisdictionTable,
}

impl TaxYearData {
    /// Build from the three source documents.
    ///
    /// The tax year comes from the config; the states table must declare
    /// the same year and the CSV must carry rows for it.
    pub fn from_sources(
        federal_csv: &str,
        states_toml: &str,
        config_toml: &str,
    ) -> Result<Self, DataError> {
        let config: TaxYearConfig =
            toml::from_str(config_toml).map_err(|err| DataError::TomlParse {
                file: TAX_YEAR_FILE,
                message: err.to_string(),
            })?;
        config.validate()?;
        let tax_year = config.tax_year;

        let states = StateTableLoader::parse(states_toml)?;
        if states.tax_year != tax_year {
            return Err(DataError::TaxYearMismatch {
                file: STATES_FILE,
                expected: tax_year,
                found: states.tax_year,
            });
        }

        let records = FederalBracketLoader::parse(federal_csv.as_bytes())?;
        let federal = FederalBracketLoader::build(&records, tax_year)?;

        info!(
            tax_year,
            states = states.states.len(),
            deadlines = config.quarterly_deadlines.len(),
            "Loaded tax year data"
        );

        Ok(Self {
            jurisdictions: JurisdictionTable::new(tax_year, federal, states.states),
            config,
        })
    }

    /// Load `federal_brackets.csv`, `states.toml` and `tax_year.toml` from
    /// `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, DataError> {
        info!(path = %dir.display(), "Loading tax year data directory");

        let federal = read(&dir.join(FEDERAL_BRACKETS_FILE))?;
        let states = read(&dir.join(STATES_FILE))?;
        let config = read(&dir.join(TAX_YEAR_FILE))?;

        Self::from_sources(&federal, &states, &config)
    }

    /// The dataset compiled into the crate.
    pub fn builtin() -> Result<Self, DataError> {
        Self::from_sources(BUILTIN_FEDERAL, BUILTIN_STATES, BUILTIN_TAX_YEAR_CONFIG)
    }

    pub fn tax_year(&self) -> i32 {
        self.config.tax_year
    }
}

fn read(path: &Path) -> Result<String, DataError> {
    fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::{FilingStatus, StateCode, TaxRegime};

    use super::*;

    #[test]
    fn builtin_loads() {
        let data = TaxYearData::builtin().expect("builtin data should load");

        assert_eq!(data.tax_year(), BUILTIN_TAX_YEAR);
        assert_eq!(data.jurisdictions.tax_year, BUILTIN_TAX_YEAR);
        assert_eq!(data.config.payroll.social_security_wage_cap, dec!(176100));
        assert_eq!(data.config.quarterly_deadlines.len(), 4);
        assert_eq!(data.config.freelance.salary_share, dec!(0.75));
    }

    #[test]
    fn builtin_federal_schedules() {
        let data = TaxYearData::builtin().expect("builtin data should load");
        let federal = &data.jurisdictions.federal;

        for status in FilingStatus::ALL {
            assert_eq!(federal.for_status(status).len(), 7, "{status}");
            assert_eq!(federal.for_status(status).top_rate(), dec!(0.37));
        }
    }

    #[test]
    fn builtin_covers_every_state_but_dc() {
        let data = TaxYearData::builtin().expect("builtin data should load");

        for &state in StateCode::ALL {
            assert_eq!(
                data.jurisdictions.has_state(state),
                state != StateCode::DistrictOfColumbia,
                "{state}"
            );
        }
    }

    #[test]
    fn builtin_no_income_tax_states() {
        let data = TaxYearData::builtin().expect("builtin data should load");

        for state in [StateCode::Texas, StateCode::Florida, StateCode::Washington] {
            let policy = data.jurisdictions.state(state);
            assert_eq!(policy.regime, TaxRegime::None);
            assert_eq!(policy.estimated_rate, dec!(0));
        }
    }

    #[test]
    fn from_sources_rejects_year_mismatch() {
        let states = BUILTIN_STATES.replacen("tax_year = 2025", "tax_year = 2024", 1);

        let err = TaxYearData::from_sources(BUILTIN_FEDERAL, &states, BUILTIN_TAX_YEAR_CONFIG)
            .expect_err("Should fail");

        assert!(matches!(
            err,
            DataError::TaxYearMismatch {
                file: STATES_FILE,
                expected: 2025,
                found: 2024
            }
        ));
    }

    #[test]
    fn from_sources_validates_config() {
        let config = BUILTIN_TAX_YEAR_CONFIG.replace("medicare_rate = \"0.0145\"", "medicare_rate = \"1.45\"");

        let err = TaxYearData::from_sources(BUILTIN_FEDERAL, BUILTIN_STATES, &config)
            .expect_err("Should fail");

        assert!(matches!(err, DataError::Config(_)), "got: {err:?}");
    }

    #[test]
    fn load_dir_missing_file() {
        let err = TaxYearData::load_dir(Path::new("/nonexistent/tax-data"))
            .expect_err("Should fail");

        match err {
            DataError::Io { path, .. } => assert!(path.ends_with(FEDERAL_BRACKETS_FILE)),
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
