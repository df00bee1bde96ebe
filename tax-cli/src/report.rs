//! Printable results.
//!
//! Calculators return unrounded amounts; everything here is rounded to cents
//! (rates to hundredths of a percent) exactly once, when the report is built.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tax_core::calculations::common::{ratio_or_zero, round_half_up};
use tax_core::calculations::{
    BracketSlice, FreelanceInputs, FreelanceResult, PayrollResult, QuarterlyResult,
};
use tax_core::{IncomeProfile, SafeHarborMethod, SelfEmploymentInputs};

fn money(value: Decimal) -> Decimal {
    round_half_up(value)
}

fn percent(rate: Decimal) -> Decimal {
    round_half_up(rate * Decimal::ONE_HUNDRED)
}

/// One `label ..... value` line.
fn line(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    value: impl fmt::Display,
) -> fmt::Result {
    writeln!(f, "  {label:<32}{value:>16}")
}

fn dollars(value: Decimal) -> String {
    format!("${value:.2}")
}

fn pct(value: Decimal) -> String {
    format!("{value:.2}%")
}

// ---------------------------------------------------------------------------
// Paycheck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaycheckReport {
    pub tax_year: i32,
    pub state: String,
    pub state_name: String,
    pub filing_status: String,
    pub total_gross: Decimal,
    pub pre_tax_deductions: Decimal,
    pub taxable_income: Decimal,
    pub federal_tax: Decimal,
    pub federal_marginal_rate_percent: Decimal,
    pub social_security_tax: Decimal,
    pub medicare_tax: Decimal,
    pub payroll_tax: Decimal,
    pub state_tax_before_credits: Decimal,
    pub state_credits_applied: Decimal,
    pub state_tax: Decimal,
    pub total_tax: Decimal,
    pub net_pay: Decimal,
    pub monthly_net_pay: Decimal,
    pub pay_periods: u32,
    pub per_period_net_pay: Decimal,
    pub effective_rate_percent: Decimal,
    pub exceeds_retirement_limit: bool,
}

impl PaycheckReport {
    pub fn new(
        tax_year: i32,
        profile: &IncomeProfile,
        result: &PayrollResult,
        pay_periods: u32,
    ) -> Self {
        Self {
            tax_year,
            state: profile.state.as_str().to_string(),
            state_name: profile.state.name().to_string(),
            filing_status: profile.filing_status.label().to_string(),
            total_gross: money(result.total_gross),
            pre_tax_deductions: money(result.pre_tax_deductions),
            taxable_income: money(result.taxable_income),
            federal_tax: money(result.federal_tax),
            federal_marginal_rate_percent: percent(result.federal_marginal_rate),
            social_security_tax: money(result.social_security_tax),
            medicare_tax: money(result.medicare_tax),
            payroll_tax: money(result.payroll_tax),
            state_tax_before_credits: money(result.state_tax_before_credits),
            state_credits_applied: money(result.state_credits_applied),
            state_tax: money(result.state_tax),
            total_tax: money(result.total_tax),
            net_pay: money(result.net_pay),
            monthly_net_pay: money(result.monthly_net_pay),
            pay_periods,
            per_period_net_pay: money(result.per_period_net_pay(pay_periods)),
            effective_rate_percent: percent(result.effective_rate),
            exceeds_retirement_limit: result.exceeds_retirement_limit,
        }
    }
}

impl fmt::Display for PaycheckReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "Paycheck estimate, {} ({}, {})",
            self.tax_year, self.filing_status, self.state_name
        )?;
        line(f, "Total gross", dollars(self.total_gross))?;
        line(f, "Pre-tax deductions", dollars(self.pre_tax_deductions))?;
        line(f, "Taxable income", dollars(self.taxable_income))?;
        line(f, "Federal income tax", dollars(self.federal_tax))?;
        line(f, "Federal marginal rate", pct(self.federal_marginal_rate_percent))?;
        line(f, "Social security", dollars(self.social_security_tax))?;
        line(f, "Medicare", dollars(self.medicare_tax))?;
        if self.state_credits_applied > Decimal::ZERO {
            line(f, "State tax before credits", dollars(self.state_tax_before_credits))?;
            line(f, "State credits", dollars(self.state_credits_applied))?;
        }
        line(f, "State income tax", dollars(self.state_tax))?;
        line(f, "Total tax", dollars(self.total_tax))?;
        line(f, "Net pay", dollars(self.net_pay))?;
        line(f, "Monthly net pay", dollars(self.monthly_net_pay))?;
        line(
            f,
            &format!("Net pay per period ({})", self.pay_periods),
            dollars(self.per_period_net_pay),
        )?;
        line(f, "Effective rate", pct(self.effective_rate_percent))?;
        if self.exceeds_retirement_limit {
            writeln!(f, "  Note: retirement contribution exceeds the annual limit")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Quarterly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallmentReport {
    pub quarter: u8,
    pub period: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterlyReport {
    pub tax_year: i32,
    pub state: String,
    pub state_name: String,
    pub filing_status: String,
    pub net_business_income: Decimal,
    pub se_tax: Decimal,
    pub se_tax_deduction: Decimal,
    pub adjusted_gross_income: Decimal,
    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub total_tax_liability: Decimal,
    pub is_high_earner: bool,
    pub prior_year_safe_harbor: Decimal,
    pub current_year_safe_harbor: Decimal,
    pub recommended_safe_harbor: Decimal,
    pub recommended_method: SafeHarborMethod,
    pub selected_method: SafeHarborMethod,
    pub quarterly_payment: Decimal,
    pub prior_year_quarterly_payment: Decimal,
    pub current_year_quarterly_payment: Decimal,
    pub underpayment_penalty_estimate: Decimal,
    pub effective_rate_percent: Decimal,
    pub schedule: Vec<InstallmentReport>,
}

impl QuarterlyReport {
    pub fn new(
        tax_year: i32,
        inputs: &SelfEmploymentInputs,
        result: &QuarterlyResult,
    ) -> Self {
        Self {
            tax_year,
            state: inputs.state.as_str().to_string(),
            state_name: inputs.state.name().to_string(),
            filing_status: inputs.filing_status.label().to_string(),
            net_business_income: money(result.net_business_income),
            se_tax: money(result.se_tax),
            se_tax_deduction: money(result.se_tax_deduction),
            adjusted_gross_income: money(result.adjusted_gross_income),
            federal_tax: money(result.federal_tax),
            state_tax: money(result.state_tax),
            total_tax_liability: money(result.total_tax_liability),
            is_high_earner: result.safe_harbor.is_high_earner,
            prior_year_safe_harbor: money(result.safe_harbor.prior_year_safe_harbor),
            current_year_safe_harbor: money(result.safe_harbor.current_year_safe_harbor),
            recommended_safe_harbor: money(result.safe_harbor.recommended_safe_harbor),
            recommended_method: result.safe_harbor.recommended_method,
            selected_method: result.selected_method,
            quarterly_payment: money(result.quarterly_payment),
            prior_year_quarterly_payment: money(result.prior_year_quarterly_payment),
            current_year_quarterly_payment: money(result.current_year_quarterly_payment),
            underpayment_penalty_estimate: money(result.underpayment_penalty_estimate),
            effective_rate_percent: percent(result.effective_rate),
            schedule: result
                .schedule
                .iter()
                .map(|installment| InstallmentReport {
                    quarter: installment.quarter,
                    period: installment.period.clone(),
                    due_date: installment.due_date,
                    amount: money(installment.amount),
                })
                .collect(),
        }
    }
}

impl fmt::Display for QuarterlyReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "Quarterly estimate, {} ({}, {})",
            self.tax_year, self.filing_status, self.state_name
        )?;
        line(f, "Net business income", dollars(self.net_business_income))?;
        line(f, "Self-employment tax", dollars(self.se_tax))?;
        line(f, "SE tax deduction", dollars(self.se_tax_deduction))?;
        line(f, "Adjusted gross income", dollars(self.adjusted_gross_income))?;
        line(f, "Federal income tax", dollars(self.federal_tax))?;
        line(f, "State income tax", dollars(self.state_tax))?;
        line(f, "Total liability", dollars(self.total_tax_liability))?;
        line(f, "Effective rate", pct(self.effective_rate_percent))?;
        writeln!(f)?;
        line(f, "Prior-year safe harbor", dollars(self.prior_year_safe_harbor))?;
        line(f, "Current-year safe harbor", dollars(self.current_year_safe_harbor))?;
        line(f, "Recommended basis", self.recommended_method)?;
        line(f, "Quarterly (prior year)", dollars(self.prior_year_quarterly_payment))?;
        line(f, "Quarterly (current year)", dollars(self.current_year_quarterly_payment))?;
        line(
            f,
            &format!("Quarterly payment ({})", self.selected_method),
            dollars(self.quarterly_payment),
        )?;
        line(f, "Penalty estimate (approx.)", dollars(self.underpayment_penalty_estimate))?;
        if self.is_high_earner {
            writeln!(f, "  Note: prior-year AGI is above the high-earner threshold")?;
        }

        if !self.schedule.is_empty() {
            writeln!(f)?;
            for installment in &self.schedule {
                writeln!(
                    f,
                    "  Q{} {:<18}due {}{:>16}",
                    installment.quarter,
                    installment.period,
                    installment.due_date,
                    dollars(installment.amount)
                )?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Freelance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreelanceReport {
    pub tax_year: i32,
    pub state: String,
    pub state_name: String,
    pub filing_status: String,
    pub gross_income: Decimal,
    pub business_expenses: Decimal,
    pub personal_benefits: Decimal,
    pub adjusted_gross: Decimal,
    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub se_tax: Decimal,
    pub total_tax: Decimal,
    pub total_deductions: Decimal,
    pub net_income: Decimal,
    pub real_hourly_rate: Decimal,
    pub efficiency_percent: Decimal,
    pub corporate_equivalent_salary: Decimal,
}

impl FreelanceReport {
    pub fn new(
        tax_year: i32,
        inputs: &FreelanceInputs,
        result: &FreelanceResult,
    ) -> Self {
        Self {
            tax_year,
            state: inputs.state.as_str().to_string(),
            state_name: inputs.state.name().to_string(),
            filing_status: inputs.filing_status.label().to_string(),
            gross_income: money(inputs.gross_income),
            business_expenses: money(inputs.business_expenses),
            personal_benefits: money(inputs.personal_benefits),
            adjusted_gross: money(result.adjusted_gross),
            federal_tax: money(result.federal_tax),
            state_tax: money(result.state_tax),
            se_tax: money(result.se_tax),
            total_tax: money(result.total_tax),
            total_deductions: money(result.total_deductions),
            net_income: money(result.net_income),
            real_hourly_rate: money(result.real_hourly_rate),
            efficiency_percent: percent(result.efficiency),
            corporate_equivalent_salary: money(result.corporate_equivalent_salary),
        }
    }
}

impl fmt::Display for FreelanceReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "Freelance profit, {} ({}, {})",
            self.tax_year, self.filing_status, self.state_name
        )?;
        line(f, "Gross income", dollars(self.gross_income))?;
        line(f, "Business expenses", dollars(self.business_expenses))?;
        line(f, "Personal benefits", dollars(self.personal_benefits))?;
        line(f, "Adjusted gross", dollars(self.adjusted_gross))?;
        line(f, "Federal income tax", dollars(self.federal_tax))?;
        line(f, "State income tax", dollars(self.state_tax))?;
        line(f, "Self-employment tax", dollars(self.se_tax))?;
        line(f, "Total tax", dollars(self.total_tax))?;
        line(f, "Net income", dollars(self.net_income))?;
        line(f, "Real hourly rate", dollars(self.real_hourly_rate))?;
        line(f, "Efficiency", pct(self.efficiency_percent))?;
        line(f, "Salary equivalent", dollars(self.corporate_equivalent_salary))
    }
}

// ---------------------------------------------------------------------------
// Brackets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceReport {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub rate_percent: Decimal,
    pub taxed_amount: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketsReport {
    pub tax_year: i32,
    pub filing_status: String,
    pub taxable_amount: Decimal,
    pub total_tax: Decimal,
    pub marginal_rate_percent: Decimal,
    pub effective_rate_percent: Decimal,
    pub slices: Vec<SliceReport>,
}

impl BracketsReport {
    pub fn new(
        tax_year: i32,
        filing_status: &str,
        taxable_amount: Decimal,
        marginal_rate: Decimal,
        slices: &[BracketSlice],
    ) -> Self {
        let total_tax: Decimal = slices.iter().map(|slice| slice.tax).sum();
        let effective_rate = ratio_or_zero(total_tax, taxable_amount);

        Self {
            tax_year,
            filing_status: filing_status.to_string(),
            taxable_amount: money(taxable_amount),
            total_tax: money(total_tax),
            marginal_rate_percent: percent(marginal_rate),
            effective_rate_percent: percent(effective_rate),
            slices: slices
                .iter()
                .map(|slice| SliceReport {
                    lower_bound: slice.lower_bound,
                    upper_bound: slice.upper_bound,
                    rate_percent: percent(slice.rate),
                    taxed_amount: money(slice.taxed_amount),
                    tax: money(slice.tax),
                })
                .collect(),
        }
    }
}

impl fmt::Display for BracketsReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "Federal brackets, {} ({}), taxable {}",
            self.tax_year,
            self.filing_status,
            dollars(self.taxable_amount)
        )?;
        for slice in &self.slices {
            let range = match slice.upper_bound {
                Some(upper) => format!("{} - {}", slice.lower_bound, upper),
                None => format!("{} and up", slice.lower_bound),
            };
            writeln!(
                f,
                "  {:<24}{:>8}{:>16}{:>14}",
                range,
                pct(slice.rate_percent),
                dollars(slice.taxed_amount),
                dollars(slice.tax)
            )?;
        }
        line(f, "Total tax", dollars(self.total_tax))?;
        line(f, "Marginal rate", pct(self.marginal_rate_percent))?;
        line(f, "Effective rate", pct(self.effective_rate_percent))
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRow {
    pub row: usize,
    #[serde(flatten)]
    pub paycheck: PaycheckReport,
    /// Present for rows with self-employment income.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarterly: Option<QuarterlyReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
}

impl fmt::Display for BatchReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "{:>4}  {:<5}{:<24}{:>14}{:>14}{:>14}{:>9}{:>14}",
            "row", "state", "filing status", "gross", "total tax", "net pay", "eff.", "quarterly"
        )?;
        for row in &self.rows {
            let p = &row.paycheck;
            let quarterly = match &row.quarterly {
                Some(q) => dollars(q.quarterly_payment),
                None => "-".to_string(),
            };
            writeln!(
                f,
                "{:>4}  {:<5}{:<24}{:>14}{:>14}{:>14}{:>9}{:>14}",
                row.row,
                p.state,
                p.filing_status,
                dollars(p.total_gross),
                dollars(p.total_tax),
                dollars(p.net_pay),
                pct(p.effective_rate_percent),
                quarterly
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Any command's output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Paycheck(PaycheckReport),
    Quarterly(QuarterlyReport),
    Freelance(FreelanceReport),
    Brackets(BracketsReport),
    Batch(BatchReport),
}

impl fmt::Display for Report {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Paycheck(report) => fmt::Display::fmt(report, f),
            Self::Quarterly(report) => fmt::Display::fmt(report, f),
            Self::Freelance(report) => fmt::Display::fmt(report, f),
            Self::Brackets(report) => fmt::Display::fmt(report, f),
            Self::Batch(report) => fmt::Display::fmt(report, f),
        }
    }
}
