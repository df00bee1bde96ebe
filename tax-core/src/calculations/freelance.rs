//! Freelance profit and its salaried equivalent.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Adjusted gross = gross income - business expenses (minimum 0) |
//! | 2    | Federal tax on adjusted gross, using the filing-status schedule |
//! | 3    | State tax = adjusted gross × the state's estimated rate |
//! | 4    | SE tax = adjusted gross × SE rate |
//! | 5    | Net income = gross - total tax - business expenses - personal benefits |
//! | 6    | Real hourly rate = net income / hours worked (0 without hours) |
//! | 7    | Efficiency = net income / gross income (0 without income) |
//! | 8    | Salary equivalent = (net income + employer benefit value) / salary share |
//!
//! Personal benefits (health cover, retirement saving) reduce take-home pay
//! but not the taxable base. Net income may be negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::bracket::progressive_tax;
use crate::calculations::common::{non_negative, ratio_or_zero};
use crate::{FilingStatus, JurisdictionTable, StateCode, TaxYearConfig};

/// Annual figures for a freelancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreelanceInputs {
    pub gross_income: Decimal,
    /// Software, marketing, hardware, office and other business costs.
    pub business_expenses: Decimal,
    /// Self-funded health cover and retirement saving.
    pub personal_benefits: Decimal,
    pub hours_worked: Decimal,
    pub filing_status: FilingStatus,
    pub state: StateCode,
}

/// Breakdown of a freelance profit calculation. Amounts are unrounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreelanceResult {
    pub adjusted_gross: Decimal,

    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub se_tax: Decimal,
    pub total_tax: Decimal,

    pub total_deductions: Decimal,
    pub net_income: Decimal,

    pub real_hourly_rate: Decimal,
    pub efficiency: Decimal,
    /// Salary a W-2 job would need to pay to match `net_income` plus benefits.
    pub corporate_equivalent_salary: Decimal,
}

#[derive(Debug, Clone)]
pub struct FreelanceCalculator<'a> {
    jurisdictions: &'a JurisdictionTable,
    config: &'a TaxYearConfig,
}

impl<'a> FreelanceCalculator<'a> {
    pub fn new(
        jurisdictions: &'a JurisdictionTable,
        config: &'a TaxYearConfig,
    ) -> Self {
        Self {
            jurisdictions,
            config,
        }
    }

    pub fn compute_freelance_profit(
        &self,
        inputs: &FreelanceInputs,
    ) -> FreelanceResult {
        let adjusted_gross =
            non_negative(inputs.gross_income.saturating_sub(inputs.business_expenses));

        let federal_schedule = self.jurisdictions.federal.for_status(inputs.filing_status);
        let federal_tax = progressive_tax(adjusted_gross, federal_schedule);
        let state_tax = adjusted_gross * self.jurisdictions.state(inputs.state).estimated_rate;
        let se_tax = adjusted_gross * self.config.self_employment.rate;
        let total_tax = federal_tax.saturating_add(state_tax).saturating_add(se_tax);

        let total_deductions = inputs
            .business_expenses
            .saturating_add(inputs.personal_benefits);
        let net_income = inputs
            .gross_income
            .saturating_sub(total_tax)
            .saturating_sub(total_deductions);

        let real_hourly_rate = ratio_or_zero(net_income, inputs.hours_worked);
        let efficiency = ratio_or_zero(net_income, inputs.gross_income);
        let corporate_equivalent_salary = self.corporate_equivalent(net_income);

        debug!(
            state = %inputs.state,
            adjusted_gross = %adjusted_gross,
            total_tax = %total_tax,
            net_income = %net_income,
            "Computed freelance profit"
        );

        FreelanceResult {
            adjusted_gross,
            federal_tax,
            state_tax,
            se_tax,
            total_tax,
            total_deductions,
            net_income,
            real_hourly_rate,
            efficiency,
            corporate_equivalent_salary,
        }
    }

    fn corporate_equivalent(
        &self,
        net_income: Decimal,
    ) -> Decimal {
        let freelance = &self.config.freelance;
        ratio_or_zero(
            net_income.saturating_add(freelance.employer_benefit_value),
            freelance.salary_share,
        )
    }
}
