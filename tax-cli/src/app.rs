//! Glue between parsed arguments, reference data and the calculators.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tax_core::calculations::{
    DEFAULT_PAY_PERIODS, FreelanceCalculator, FreelanceInputs, PayrollCalculator,
    QuarterlyEstimator, bracket_breakdown, marginal_rate,
};
use tax_core::{
    IncomeProfile, SafeHarborInputs, SafeHarborMethod, SelfEmploymentInputs, TaxRegime,
};
use tax_data::TaxYearData;
use tracing::{debug, info};

use crate::cli::{BatchArgs, BracketsArgs, Command, FreelanceArgs, PaycheckArgs, QuarterlyArgs};
use crate::csv_loader::{self, BatchProfile};
use crate::report::{
    BatchReport, BatchRow, BracketsReport, FreelanceReport, PaycheckReport, QuarterlyReport,
    Report,
};

/// Retirement contribution from either an amount or a percent of wages.
///
/// The amount wins when both are given; with neither the contribution is
/// zero.
pub fn retirement_amount(
    wages: Decimal,
    amount: Option<Decimal>,
    percent: Option<Decimal>,
) -> Decimal {
    match (amount, percent) {
        (Some(amount), _) => amount,
        (None, Some(percent)) => wages * percent / Decimal::ONE_HUNDRED,
        (None, None) => Decimal::ZERO,
    }
}

/// Reference data from `data_dir`, or the bundled tax year.
pub fn load_data(data_dir: Option<&Path>) -> Result<TaxYearData> {
    match data_dir {
        Some(dir) => TaxYearData::load_dir(dir)
            .with_context(|| format!("Failed to load tax data from {}", dir.display())),
        None => TaxYearData::builtin().context("Failed to load bundled tax data"),
    }
}

/// Runs one subcommand against `data`.
pub fn run(
    command: &Command,
    data: &TaxYearData,
) -> Result<Report> {
    let report = match command {
        Command::Paycheck(args) => Report::Paycheck(paycheck(args, data)),
        Command::Quarterly(args) => Report::Quarterly(quarterly(args, data)),
        Command::Freelance(args) => Report::Freelance(freelance(args, data)),
        Command::Brackets(args) => Report::Brackets(brackets(args, data)),
        Command::Batch(args) => Report::Batch(batch(args, data)?),
    };
    Ok(report)
}

fn paycheck(
    args: &PaycheckArgs,
    data: &TaxYearData,
) -> PaycheckReport {
    let profile = IncomeProfile {
        bonus: args.bonus,
        retirement_contribution: retirement_amount(
            args.wages,
            args.retirement,
            args.retirement_percent,
        ),
        health_insurance_premium: args.health_premium,
        selected_credits: args.credits.clone(),
        ..IncomeProfile::wages_only(args.wages, args.filing_status, args.state)
    };

    paycheck_for(&profile, data, args.pay_periods)
}

fn paycheck_for(
    profile: &IncomeProfile,
    data: &TaxYearData,
    pay_periods: u32,
) -> PaycheckReport {
    let calculator = PayrollCalculator::new(&data.jurisdictions, &data.config.payroll);
    let result = calculator.compute_net_pay(profile);
    PaycheckReport::new(data.tax_year(), profile, &result, pay_periods)
}

fn quarterly(
    args: &QuarterlyArgs,
    data: &TaxYearData,
) -> QuarterlyReport {
    let inputs = SelfEmploymentInputs {
        self_employment_gross: args.se_gross,
        business_expenses: args.expenses,
        w2_income: args.w2_income,
        filing_status: args.filing_status,
        state: args.state,
        method: args.method,
    };
    let prior_year = SafeHarborInputs {
        prior_year_tax: args.prior_year_tax,
        prior_year_agi: args.prior_year_agi,
    };

    quarterly_for(&inputs, &prior_year, data)
}

fn quarterly_for(
    inputs: &SelfEmploymentInputs,
    prior_year: &SafeHarborInputs,
    data: &TaxYearData,
) -> QuarterlyReport {
    let estimator = QuarterlyEstimator::new(&data.jurisdictions, &data.config);
    let result = estimator.compute_quarterly_obligation(inputs, prior_year);
    QuarterlyReport::new(data.tax_year(), inputs, &result)
}

fn freelance(
    args: &FreelanceArgs,
    data: &TaxYearData,
) -> FreelanceReport {
    let inputs = FreelanceInputs {
        gross_income: args.gross,
        business_expenses: args.expenses,
        personal_benefits: args.benefits,
        hours_worked: args.hours,
        filing_status: args.filing_status,
        state: args.state,
    };

    let calculator = FreelanceCalculator::new(&data.jurisdictions, &data.config);
    let result = calculator.compute_freelance_profit(&inputs);
    FreelanceReport::new(data.tax_year(), &inputs, &result)
}

fn brackets(
    args: &BracketsArgs,
    data: &TaxYearData,
) -> BracketsReport {
    let schedule = data.jurisdictions.federal.for_status(args.filing_status);
    let slices = bracket_breakdown(args.amount, schedule);
    let rate = marginal_rate(args.amount, &TaxRegime::Progressive(schedule.clone()));

    debug!(
        amount = %args.amount,
        filing_status = args.filing_status.as_str(),
        slices = slices.len(),
        "Computed bracket breakdown"
    );

    BracketsReport::new(
        data.tax_year(),
        args.filing_status.label(),
        args.amount,
        rate,
        &slices,
    )
}

fn batch(
    args: &BatchArgs,
    data: &TaxYearData,
) -> Result<BatchReport> {
    let profiles = csv_loader::load_from_file(&args.file)
        .with_context(|| format!("Failed to load profiles from {}", args.file.display()))?;

    info!(
        path = %args.file.display(),
        rows = profiles.len(),
        "Loaded batch profiles"
    );

    let rows = profiles
        .iter()
        .enumerate()
        .map(|(idx, batch_profile)| batch_row(idx + 1, batch_profile, args.method, data))
        .collect();

    Ok(BatchReport { rows })
}

fn batch_row(
    row: usize,
    batch_profile: &BatchProfile,
    method: SafeHarborMethod,
    data: &TaxYearData,
) -> BatchRow {
    let profile = &batch_profile.profile;
    let quarterly = (profile.self_employment_gross > Decimal::ZERO).then(|| {
        let inputs = SelfEmploymentInputs::from_profile(profile, method);
        quarterly_for(&inputs, &batch_profile.prior_year, data)
    });

    BatchRow {
        row,
        paycheck: paycheck_for(profile, data, DEFAULT_PAY_PERIODS),
        quarterly,
    }
}
