//! State policy tables in TOML.
//!
//! ```toml
//! tax_year = 2025
//!
//! [states.IL]
//! name = "Illinois"
//! standard_deduction = 2775
//! estimated_rate = "0.0495"
//! regime = { kind = "flat", rate = "0.0495" }
//!
//! [states.CA]
//! name = "California"
//! standard_deduction = 5363
//! estimated_rate = "0.093"
//!
//! [states.CA.regime]
//! kind = "progressive"
//! brackets = [{ upper_bound = 10756, rate = "0.01" }, { rate = "0.133" }]
//!
//! [[states.CA.credits]]
//! id = "ca_renter"
//! label = "Renter's Credit"
//! amount = 60
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{
    BracketTable, FlatRatePolicy, StateCode, StateCredit, StatePolicy, TaxBracket, TaxRegime,
};
use tracing::debug;

use crate::error::DataError;
use crate::year::STATES_FILE;

#[derive(Debug, Deserialize)]
struct StatesFile {
    tax_year: i32,
    #[serde(default)]
    states: BTreeMap<String, StateRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StateRecord {
    name: String,
    #[serde(default)]
    standard_deduction: Decimal,
    #[serde(default)]
    estimated_rate: Decimal,
    regime: RegimeRecord,
    #[serde(default)]
    credits: Vec<CreditRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RegimeRecord {
    None,
    Flat { rate: Decimal },
    Progressive { brackets: Vec<TaxBracket> },
}

#[derive(Debug, Deserialize)]
struct CreditRecord {
    id: String,
    label: String,
    amount: Decimal,
    #[serde(default)]
    description: String,
}

/// State policies for one tax year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTable {
    pub tax_year: i32,
    pub states: BTreeMap<StateCode, StatePolicy>,
}

/// Loader for state policy tables.
pub struct StateTableLoader;

impl StateTableLoader {
    /// Parse and validate a states TOML document.
    ///
    /// Unknown state codes, out-of-range rates and malformed bracket tables
    /// are rejected here so calculations never see them.
    pub fn parse(input: &str) -> Result<StateTable, DataError> {
        let file: StatesFile = toml::from_str(input).map_err(|err| DataError::TomlParse {
            file: STATES_FILE,
            message: err.to_string(),
        })?;

        let mut states = BTreeMap::new();
        for (code, record) in file.states {
            let state =
                StateCode::parse(&code).ok_or_else(|| DataError::UnknownState(code.clone()))?;
            let policy = Self::policy(state, record)?;
            debug!(state = %state, regime = policy.regime.kind(), "Loaded state policy");
            states.insert(state, policy);
        }

        Ok(StateTable {
            tax_year: file.tax_year,
            states,
        })
    }

    fn policy(
        state: StateCode,
        record: StateRecord,
    ) -> Result<StatePolicy, DataError> {
        check_rate(state, "estimated_rate", record.estimated_rate)?;
        if record.standard_deduction < Decimal::ZERO {
            return Err(DataError::NegativeDeduction {
                state,
                value: record.standard_deduction,
            });
        }

        let regime = match record.regime {
            RegimeRecord::None => TaxRegime::None,
            RegimeRecord::Flat { rate } => TaxRegime::Flat(
                FlatRatePolicy::try_new(rate)
                    .map_err(|source| DataError::StateRegime { state, source })?,
            ),
            RegimeRecord::Progressive { brackets } => TaxRegime::Progressive(
                BracketTable::try_new(brackets)
                    .map_err(|source| DataError::StateRegime { state, source })?,
            ),
        };

        let credits = record
            .credits
            .into_iter()
            .map(|credit| {
                if credit.amount < Decimal::ZERO {
                    return Err(DataError::NegativeCredit {
                        state,
                        id: credit.id,
                        value: credit.amount,
                    });
                }
                Ok(StateCredit {
                    id: credit.id,
                    label: credit.label,
                    amount: credit.amount,
                    description: credit.description,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StatePolicy {
            name: record.name,
            regime,
            standard_deduction: record.standard_deduction,
            estimated_rate: record.estimated_rate,
            credits,
        })
    }
}

fn check_rate(
    state: StateCode,
    field: &'static str,
    value: Decimal,
) -> Result<(), DataError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(DataError::StateRate {
            state,
            field,
            value,
        });
    }
    Ok(())
}
