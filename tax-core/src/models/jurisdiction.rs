use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::filing_status::FilingStatus;
use super::tax_bracket::BracketTable;
use super::tax_regime::TaxRegime;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown state code '{0}'")]
pub struct UnknownStateCode(pub String);

macro_rules! state_codes {
    ($($variant:ident => $code:literal, $name:literal;)+) => {
        /// Two-letter code for each of the 50 states plus the District of
        /// Columbia.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum StateCode {
            $($variant,)+
        }

        impl StateCode {
            pub const ALL: &'static [StateCode] = &[$(Self::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Case-insensitive lookup by two-letter code.
            pub fn parse(s: &str) -> Option<Self> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

state_codes! {
    Alabama => "AL", "Alabama";
    Alaska => "AK", "Alaska";
    Arizona => "AZ", "Arizona";
    Arkansas => "AR", "Arkansas";
    California => "CA", "California";
    Colorado => "CO", "Colorado";
    Connecticut => "CT", "Connecticut";
    Delaware => "DE", "Delaware";
    DistrictOfColumbia => "DC", "District of Columbia";
    Florida => "FL", "Florida";
    Georgia => "GA", "Georgia";
    Hawaii => "HI", "Hawaii";
    Idaho => "ID", "Idaho";
    Illinois => "IL", "Illinois";
    Indiana => "IN", "Indiana";
    Iowa => "IA", "Iowa";
    Kansas => "KS", "Kansas";
    Kentucky => "KY", "Kentucky";
    Louisiana => "LA", "Louisiana";
    Maine => "ME", "Maine";
    Maryland => "MD", "Maryland";
    Massachusetts => "MA", "Massachusetts";
    Michigan => "MI", "Michigan";
    Minnesota => "MN", "Minnesota";
    Mississippi => "MS", "Mississippi";
    Missouri => "MO", "Missouri";
    Montana => "MT", "Montana";
    Nebraska => "NE", "Nebraska";
    Nevada => "NV", "Nevada";
    NewHampshire => "NH", "New Hampshire";
    NewJersey => "NJ", "New Jersey";
    NewMexico => "NM", "New Mexico";
    NewYork => "NY", "New York";
    NorthCarolina => "NC", "North Carolina";
    NorthDakota => "ND", "North Dakota";
    Ohio => "OH", "Ohio";
    Oklahoma => "OK", "Oklahoma";
    Oregon => "OR", "Oregon";
    Pennsylvania => "PA", "Pennsylvania";
    RhodeIsland => "RI", "Rhode Island";
    SouthCarolina => "SC", "South Carolina";
    SouthDakota => "SD", "South Dakota";
    Tennessee => "TN", "Tennessee";
    Texas => "TX", "Texas";
    Utah => "UT", "Utah";
    Vermont => "VT", "Vermont";
    Virginia => "VA", "Virginia";
    Washington => "WA", "Washington";
    WestVirginia => "WV", "West Virginia";
    Wisconsin => "WI", "Wisconsin";
    Wyoming => "WY", "Wyoming";
}

impl TryFrom<String> for StateCode {
    type Error = UnknownStateCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(UnknownStateCode(value))
    }
}

impl From<StateCode> for &'static str {
    fn from(code: StateCode) -> Self {
        code.as_str()
    }
}

impl fmt::Display for StateCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed-amount state credit the taxpayer can opt into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCredit {
    pub id: String,
    pub label: String,
    pub amount: Decimal,
    pub description: String,
}

/// Everything the composers need to know about one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatePolicy {
    pub name: String,

    /// Regime used by the paycheck calculation.
    pub regime: TaxRegime,

    /// Subtracted from taxable wages before the state regime applies.
    pub standard_deduction: Decimal,

    /// Flat rate used by the quarterly estimate, regardless of `regime`.
    pub estimated_rate: Decimal,

    #[serde(default)]
    pub credits: Vec<StateCredit>,
}

impl StatePolicy {
    /// Policy applied to a state the table has no row for.
    pub fn no_income_tax() -> Self {
        Self {
            name: "No state income tax".to_string(),
            regime: TaxRegime::None,
            standard_deduction: Decimal::ZERO,
            estimated_rate: Decimal::ZERO,
            credits: Vec::new(),
        }
    }

    /// Total of the credits whose id appears in `selected`.
    ///
    /// Each credit counts once no matter how often its id is repeated; ids
    /// that this state does not offer are ignored.
    pub fn selected_credits_total(
        &self,
        selected: &[String],
    ) -> Decimal {
        self.credits
            .iter()
            .filter(|credit| selected.iter().any(|id| *id == credit.id))
            .map(|credit| credit.amount)
            .sum()
    }
}

/// Federal schedules, one per filing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalBrackets {
    pub single: BracketTable,
    pub married_filing_jointly: BracketTable,
    pub head_of_household: BracketTable,
}

impl FederalBrackets {
    pub fn for_status(
        &self,
        status: FilingStatus,
    ) -> &BracketTable {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedFilingJointly => &self.married_filing_jointly,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
        }
    }
}

/// Reference tables for one tax year.
///
/// Built once from data and passed by reference into the calculators; nothing
/// mutates it after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionTable {
    pub tax_year: i32,
    pub federal: FederalBrackets,
    states: BTreeMap<StateCode, StatePolicy>,
    #[serde(skip, default = "StatePolicy::no_income_tax")]
    fallback: StatePolicy,
}

impl JurisdictionTable {
    pub fn new(
        tax_year: i32,
        federal: FederalBrackets,
        states: BTreeMap<StateCode, StatePolicy>,
    ) -> Self {
        Self {
            tax_year,
            federal,
            states,
            fallback: StatePolicy::no_income_tax(),
        }
    }

    /// Policy for `code`, or the zero-tax policy when the table has no row.
    pub fn state(
        &self,
        code: StateCode,
    ) -> &StatePolicy {
        match self.states.get(&code) {
            Some(policy) => policy,
            None => {
                warn!(
                    state = %code,
                    tax_year = self.tax_year,
                    "No policy for state; treating it as having no income tax"
                );
                &self.fallback
            }
        }
    }

    pub fn has_state(
        &self,
        code: StateCode,
    ) -> bool {
        self.states.contains_key(&code)
    }
}
