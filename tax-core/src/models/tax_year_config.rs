use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a tax-year configuration fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxYearConfigError {
    #[error("{field} must be between 0 and 1, got {value}")]
    RateOutOfRange { field: &'static str, value: Decimal },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: Decimal },

    #[error("{field} cannot be negative, got {value}")]
    Negative { field: &'static str, value: Decimal },

    #[error("high earner multiplier must be at least 1, got {0}")]
    InvalidHighEarnerMultiplier(Decimal),

    #[error("expected quarterly deadlines for quarters 1 through 4 in order, got {0:?}")]
    InvalidDeadlines(Vec<u8>),
}

/// Employee-side payroll tax parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollTaxConfig {
    /// Wages above this amount are not subject to the social security rate.
    pub social_security_wage_cap: Decimal,
    pub social_security_rate: Decimal,
    /// Applies to all wages; there is no cap.
    pub medicare_rate: Decimal,
    /// Annual elective-deferral limit, used only to flag over-contribution.
    pub retirement_contribution_limit: Decimal,
}

/// Self-employment tax parameters used by the quarterly estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfEmploymentConfig {
    /// Combined social security and Medicare rate for the self-employed.
    pub rate: Decimal,
    /// Share of self-employment tax deducted from income.
    pub deduction_factor: Decimal,
}

impl Default for SelfEmploymentConfig {
    fn default() -> Self {
        Self {
            rate: dec!(0.153),
            deduction_factor: dec!(0.5),
        }
    }
}

/// Safe-harbor thresholds for estimated payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeHarborConfig {
    /// Prior-year AGI strictly above this makes the taxpayer a high earner.
    pub high_earner_threshold: Decimal,
    /// Applied to prior-year tax for high earners.
    pub high_earner_multiplier: Decimal,
    /// Share of current-year liability that satisfies the current-year test.
    pub current_year_factor: Decimal,
    /// Flat annual rate used for the underpayment penalty estimate.
    pub penalty_rate: Decimal,
}

impl Default for SafeHarborConfig {
    fn default() -> Self {
        Self {
            high_earner_threshold: dec!(150000),
            high_earner_multiplier: dec!(1.10),
            current_year_factor: dec!(0.90),
            penalty_rate: dec!(0.08),
        }
    }
}

/// Parameters for comparing freelance profit with a salaried job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreelanceConfig {
    /// Annual value of employer-provided benefits a freelancer forgoes.
    pub employer_benefit_value: Decimal,
    /// Share of total compensation an employer pays out as salary.
    pub salary_share: Decimal,
}

impl Default for FreelanceConfig {
    fn default() -> Self {
        Self {
            employer_benefit_value: dec!(13200),
            salary_share: dec!(0.75),
        }
    }
}

/// Due date for one estimated-tax installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyDeadline {
    pub quarter: u8,
    /// Human-readable income period, e.g. `Jan 1 - Mar 31`.
    pub period: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub tax_year: i32,
    pub payroll: PayrollTaxConfig,
    #[serde(default)]
    pub self_employment: SelfEmploymentConfig,
    #[serde(default)]
    pub safe_harbor: SafeHarborConfig,
    #[serde(default)]
    pub freelance: FreelanceConfig,
    #[serde(default)]
    pub quarterly_deadlines: Vec<QuarterlyDeadline>,
}

fn check_rate(
    field: &'static str,
    value: Decimal,
) -> Result<(), TaxYearConfigError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(TaxYearConfigError::RateOutOfRange { field, value });
    }
    Ok(())
}

fn check_positive(
    field: &'static str,
    value: Decimal,
) -> Result<(), TaxYearConfigError> {
    if value <= Decimal::ZERO {
        return Err(TaxYearConfigError::NotPositive { field, value });
    }
    Ok(())
}

impl TaxYearConfig {
    /// Validates every rate and limit.
    ///
    /// Deadlines are optional, but when present there must be exactly four,
    /// numbered 1 to 4 in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`TaxYearConfigError`] found.
    pub fn validate(&self) -> Result<(), TaxYearConfigError> {
        let payroll = &self.payroll;
        check_positive("social_security_wage_cap", payroll.social_security_wage_cap)?;
        check_rate("social_security_rate", payroll.social_security_rate)?;
        check_rate("medicare_rate", payroll.medicare_rate)?;
        check_positive(
            "retirement_contribution_limit",
            payroll.retirement_contribution_limit,
        )?;

        check_rate("self_employment.rate", self.self_employment.rate)?;
        check_rate(
            "self_employment.deduction_factor",
            self.self_employment.deduction_factor,
        )?;

        let safe_harbor = &self.safe_harbor;
        check_positive("high_earner_threshold", safe_harbor.high_earner_threshold)?;
        if safe_harbor.high_earner_multiplier < Decimal::ONE {
            return Err(TaxYearConfigError::InvalidHighEarnerMultiplier(
                safe_harbor.high_earner_multiplier,
            ));
        }
        check_rate("current_year_factor", safe_harbor.current_year_factor)?;
        check_rate("penalty_rate", safe_harbor.penalty_rate)?;

        if self.freelance.employer_benefit_value < Decimal::ZERO {
            return Err(TaxYearConfigError::Negative {
                field: "freelance.employer_benefit_value",
                value: self.freelance.employer_benefit_value,
            });
        }
        check_positive("freelance.salary_share", self.freelance.salary_share)?;
        check_rate("freelance.salary_share", self.freelance.salary_share)?;

        if !self.quarterly_deadlines.is_empty() {
            let quarters: Vec<u8> = self
                .quarterly_deadlines
                .iter()
                .map(|deadline| deadline.quarter)
                .collect();
            if quarters != [1, 2, 3, 4] {
                return Err(TaxYearConfigError::InvalidDeadlines(quarters));
            }
        }

        Ok(())
    }
}
