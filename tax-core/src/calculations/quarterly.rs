//! Quarterly estimated payments for self-employment income.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Net business income = SE gross - business expenses (minimum 0) |
//! | 2    | SE tax = net business income × SE rate |
//! | 3    | SE tax deduction = SE tax × deduction factor |
//! | 4    | AGI = W-2 income + net business income - SE tax deduction |
//! | 5    | Federal tax on AGI, using the filing-status schedule |
//! | 6    | State tax = AGI × the state's estimated rate |
//! | 7    | Total liability = federal + state + SE tax |
//! | 8    | Safe-harbor thresholds (see [`SafeHarborRule`]) |
//! | 9    | Quarterly payment = selected safe-harbor basis / 4 |
//! | 10   | Underpayment penalty estimate |
//!
//! The SE rate is applied to every dollar of net business income with no
//! social security wage cap, and the state share always uses the flat
//! estimated rate even for states with a progressive payroll regime.
//! Income sums saturate at [`Decimal::MAX`] instead of overflowing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::bracket::progressive_tax;
use crate::calculations::common::{non_negative, ratio_or_zero};
use crate::calculations::safe_harbor::{SafeHarborEvaluation, SafeHarborRule};
use crate::{
    JurisdictionTable, SafeHarborInputs, SafeHarborMethod, SelfEmploymentInputs, TaxYearConfig,
};

const QUARTERS_PER_YEAR: i64 = 4;

/// One scheduled estimated-tax payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyInstallment {
    pub quarter: u8,
    pub period: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

/// Breakdown of a quarterly estimate. Amounts are unrounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyResult {
    pub net_business_income: Decimal,
    pub se_tax: Decimal,
    pub se_tax_deduction: Decimal,
    pub adjusted_gross_income: Decimal,

    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub total_tax_liability: Decimal,

    pub safe_harbor: SafeHarborEvaluation,
    pub selected_method: SafeHarborMethod,

    /// Installment under `selected_method`.
    pub quarterly_payment: Decimal,
    pub prior_year_quarterly_payment: Decimal,
    pub current_year_quarterly_payment: Decimal,

    /// Planning estimate only; not a Form 2210 computation.
    pub underpayment_penalty_estimate: Decimal,

    /// Total liability over AGI.
    pub effective_rate: Decimal,

    /// Empty when the tax year has no deadlines configured.
    pub schedule: Vec<QuarterlyInstallment>,
}

/// Quarterly estimator bound to one year's reference data.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
///
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::QuarterlyEstimator;
/// use tax_core::{
///     BracketTable, FederalBrackets, FilingStatus, JurisdictionTable, PayrollTaxConfig,
///     SafeHarborInputs, SafeHarborMethod, SelfEmploymentInputs, StateCode, TaxYearConfig,
/// };
///
/// let flat = BracketTable::single_rate(dec!(0.10)).unwrap();
/// let jurisdictions = JurisdictionTable::new(
///     2025,
///     FederalBrackets {
///         single: flat.clone(),
///         married_filing_jointly: flat.clone(),
///         head_of_household: flat,
///     },
///     BTreeMap::new(),
/// );
/// let config = TaxYearConfig {
///     tax_year: 2025,
///     payroll: PayrollTaxConfig {
///         social_security_wage_cap: dec!(176100),
///         social_security_rate: dec!(0.062),
///         medicare_rate: dec!(0.0145),
///         retirement_contribution_limit: dec!(23500),
///     },
///     self_employment: Default::default(),
///     safe_harbor: Default::default(),
///     freelance: Default::default(),
///     quarterly_deadlines: vec![],
/// };
///
/// let estimator = QuarterlyEstimator::new(&jurisdictions, &config);
/// let inputs = SelfEmploymentInputs {
///     self_employment_gross: dec!(100000),
///     business_expenses: dec!(20000),
///     w2_income: dec!(0),
///     filing_status: FilingStatus::Single,
///     state: StateCode::Texas,
///     method: SafeHarborMethod::PriorYear,
/// };
/// let prior = SafeHarborInputs {
///     prior_year_tax: dec!(22000),
///     prior_year_agi: dec!(100000),
/// };
///
/// let result = estimator.compute_quarterly_obligation(&inputs, &prior);
///
/// assert_eq!(result.net_business_income, dec!(80000));
/// assert_eq!(result.se_tax, dec!(12240));
/// assert_eq!(result.se_tax_deduction, dec!(6120));
/// assert_eq!(result.quarterly_payment, dec!(5500));
/// ```
#[derive(Debug, Clone)]
pub struct QuarterlyEstimator<'a> {
    jurisdictions: &'a JurisdictionTable,
    config: &'a TaxYearConfig,
}

impl<'a> QuarterlyEstimator<'a> {
    pub fn new(
        jurisdictions: &'a JurisdictionTable,
        config: &'a TaxYearConfig,
    ) -> Self {
        Self {
            jurisdictions,
            config,
        }
    }

    pub fn compute_quarterly_obligation(
        &self,
        inputs: &SelfEmploymentInputs,
        prior_year: &SafeHarborInputs,
    ) -> QuarterlyResult {
        let net_business_income = self.net_business_income(inputs);
        let se_tax = self.se_tax(net_business_income);
        let se_tax_deduction = self.se_tax_deduction(se_tax);
        let adjusted_gross_income = inputs
            .w2_income
            .saturating_add(net_business_income)
            .saturating_sub(se_tax_deduction);

        let federal_schedule = self.jurisdictions.federal.for_status(inputs.filing_status);
        let federal_tax = progressive_tax(adjusted_gross_income, federal_schedule);

        let state_rate = self.jurisdictions.state(inputs.state).estimated_rate;
        let state_tax = non_negative(adjusted_gross_income) * state_rate;

        let total_tax_liability = federal_tax.saturating_add(state_tax).saturating_add(se_tax);

        let rule = SafeHarborRule::new(&self.config.safe_harbor);
        let safe_harbor = rule.evaluate(prior_year, total_tax_liability);
        let underpayment_penalty_estimate = rule.penalty_estimate(total_tax_liability, &safe_harbor);

        let prior_year_quarterly_payment =
            self.per_quarter(safe_harbor.basis(SafeHarborMethod::PriorYear));
        let current_year_quarterly_payment =
            self.per_quarter(safe_harbor.basis(SafeHarborMethod::CurrentYear));
        let quarterly_payment = match inputs.method {
            SafeHarborMethod::PriorYear => prior_year_quarterly_payment,
            SafeHarborMethod::CurrentYear => current_year_quarterly_payment,
        };

        let effective_rate = ratio_or_zero(total_tax_liability, adjusted_gross_income);
        let schedule = self.schedule(quarterly_payment);

        debug!(
            state = %inputs.state,
            method = %inputs.method,
            adjusted_gross_income = %adjusted_gross_income,
            total_tax_liability = %total_tax_liability,
            quarterly_payment = %quarterly_payment,
            "Computed quarterly obligation"
        );

        QuarterlyResult {
            net_business_income,
            se_tax,
            se_tax_deduction,
            adjusted_gross_income,
            federal_tax,
            state_tax,
            total_tax_liability,
            safe_harbor,
            selected_method: inputs.method,
            quarterly_payment,
            prior_year_quarterly_payment,
            current_year_quarterly_payment,
            underpayment_penalty_estimate,
            effective_rate,
            schedule,
        }
    }

    fn net_business_income(
        &self,
        inputs: &SelfEmploymentInputs,
    ) -> Decimal {
        non_negative(inputs.self_employment_gross.saturating_sub(inputs.business_expenses))
    }

    fn se_tax(
        &self,
        net_business_income: Decimal,
    ) -> Decimal {
        net_business_income * self.config.self_employment.rate
    }

    fn se_tax_deduction(
        &self,
        se_tax: Decimal,
    ) -> Decimal {
        se_tax * self.config.self_employment.deduction_factor
    }

    fn per_quarter(
        &self,
        annual: Decimal,
    ) -> Decimal {
        annual / Decimal::from(QUARTERS_PER_YEAR)
    }

    fn schedule(
        &self,
        quarterly_payment: Decimal,
    ) -> Vec<QuarterlyInstallment> {
        self.config
            .quarterly_deadlines
            .iter()
            .map(|deadline| QuarterlyInstallment {
                quarter: deadline.quarter,
                period: deadline.period.clone(),
                due_date: deadline.due_date,
                amount: quarterly_payment,
            })
            .collect()
    }
}
