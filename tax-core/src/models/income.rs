use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::filing_status::FilingStatus;
use super::jurisdiction::StateCode;

/// Per-request income description supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeProfile {
    pub wages: Decimal,
    pub bonus: Decimal,
    pub self_employment_gross: Decimal,
    pub business_expenses: Decimal,

    /// Absolute amount; percent-of-wages conversion is the caller's job.
    pub retirement_contribution: Decimal,
    pub health_insurance_premium: Decimal,

    pub filing_status: FilingStatus,
    pub state: StateCode,

    /// Ids of state credits the taxpayer claims.
    #[serde(default)]
    pub selected_credits: Vec<String>,
}

impl IncomeProfile {
    /// A wage-only profile with no deductions.
    pub fn wages_only(
        wages: Decimal,
        filing_status: FilingStatus,
        state: StateCode,
    ) -> Self {
        Self {
            wages,
            bonus: Decimal::ZERO,
            self_employment_gross: Decimal::ZERO,
            business_expenses: Decimal::ZERO,
            retirement_contribution: Decimal::ZERO,
            health_insurance_premium: Decimal::ZERO,
            filing_status,
            state,
            selected_credits: Vec::new(),
        }
    }
}

/// Which safe-harbor basis drives the quarterly installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeHarborMethod {
    #[default]
    PriorYear,
    CurrentYear,
}

impl SafeHarborMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriorYear => "prior_year",
            Self::CurrentYear => "current_year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "prior_year" | "prior" => Some(Self::PriorYear),
            "current_year" | "current" => Some(Self::CurrentYear),
            _ => None,
        }
    }
}

impl fmt::Display for SafeHarborMethod {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the self-employment quarterly estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfEmploymentInputs {
    pub self_employment_gross: Decimal,
    pub business_expenses: Decimal,
    pub w2_income: Decimal,
    pub filing_status: FilingStatus,
    pub state: StateCode,
    #[serde(default)]
    pub method: SafeHarborMethod,
}

impl SelfEmploymentInputs {
    /// Derives quarterly inputs from a full profile; wages and bonus count
    /// as W-2 income.
    pub fn from_profile(
        profile: &IncomeProfile,
        method: SafeHarborMethod,
    ) -> Self {
        Self {
            self_employment_gross: profile.self_employment_gross,
            business_expenses: profile.business_expenses,
            w2_income: profile.wages.saturating_add(profile.bonus),
            filing_status: profile.filing_status,
            state: profile.state,
            method,
        }
    }
}

/// Prior-year figures for the safe-harbor test.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SafeHarborInputs {
    pub prior_year_tax: Decimal,
    pub prior_year_agi: Decimal,
}
