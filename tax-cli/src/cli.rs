use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tax_core::calculations::DEFAULT_PAY_PERIODS;
use tax_core::{FilingStatus, SafeHarborMethod, StateCode};

/// Estimate federal, payroll and state taxes for wage earners and the
/// self-employed.
#[derive(Parser, Debug)]
#[command(name = "tax-estimator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding federal_brackets.csv, states.toml and tax_year.toml
    /// (defaults to the bundled tax year)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON instead of a text table
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Log filter, e.g. `debug` or `warn,tax_core=debug` (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also append log records to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Annual net pay for a salaried employee
    Paycheck(PaycheckArgs),
    /// Quarterly estimated payments for self-employment income
    Quarterly(QuarterlyArgs),
    /// Freelance take-home pay and the salary that would match it
    Freelance(FreelanceArgs),
    /// Per-bracket federal tax for a taxable amount
    Brackets(BracketsArgs),
    /// Net pay, and quarterly estimates for self-employment income, for every
    /// income profile in a CSV file
    Batch(BatchArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PaycheckArgs {
    /// Annual wages
    #[arg(long)]
    pub wages: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub bonus: Decimal,

    /// Pre-tax retirement contribution as an amount
    #[arg(long, conflicts_with = "retirement_percent")]
    pub retirement: Option<Decimal>,

    /// Pre-tax retirement contribution as a percent of wages
    #[arg(long)]
    pub retirement_percent: Option<Decimal>,

    /// Annual pre-tax health insurance premium
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub health_premium: Decimal,

    /// Two-letter state code
    #[arg(long, value_parser = parse_state)]
    pub state: StateCode,

    /// S, MFJ or HOH
    #[arg(long, value_parser = parse_filing_status, default_value = "S")]
    pub filing_status: FilingStatus,

    /// State credit id to claim; repeat for several
    #[arg(long = "credit")]
    pub credits: Vec<String>,

    /// Paychecks per year, for the per-period net pay
    #[arg(long, default_value_t = DEFAULT_PAY_PERIODS)]
    pub pay_periods: u32,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct QuarterlyArgs {
    /// Self-employment gross receipts
    #[arg(long)]
    pub se_gross: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub expenses: Decimal,

    /// W-2 wages earned alongside the business
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub w2_income: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub prior_year_tax: Decimal,

    #[arg(long, default_value_t = Decimal::ZERO)]
    pub prior_year_agi: Decimal,

    #[arg(long, value_parser = parse_state)]
    pub state: StateCode,

    #[arg(long, value_parser = parse_filing_status, default_value = "S")]
    pub filing_status: FilingStatus,

    /// Safe-harbor basis for the installment: prior-year or current-year
    #[arg(long, value_parser = parse_method, default_value = "prior-year")]
    pub method: SafeHarborMethod,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FreelanceArgs {
    /// Annual gross receipts
    #[arg(long)]
    pub gross: Decimal,

    /// Annual business expenses (software, marketing, hardware, office)
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub expenses: Decimal,

    /// Self-funded health cover and retirement saving
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub benefits: Decimal,

    /// Hours worked in the year
    #[arg(long, default_value = "2080")]
    pub hours: Decimal,

    #[arg(long, value_parser = parse_state)]
    pub state: StateCode,

    #[arg(long, value_parser = parse_filing_status, default_value = "S")]
    pub filing_status: FilingStatus,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct BracketsArgs {
    /// Taxable amount
    #[arg(long)]
    pub amount: Decimal,

    #[arg(long, value_parser = parse_filing_status, default_value = "S")]
    pub filing_status: FilingStatus,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct BatchArgs {
    /// CSV of income profiles
    #[arg(short, long)]
    pub file: PathBuf,

    /// Safe-harbor basis for rows with self-employment income
    #[arg(long, value_parser = parse_method, default_value = "prior-year")]
    pub method: SafeHarborMethod,
}

fn parse_state(value: &str) -> Result<StateCode, String> {
    StateCode::parse(value).ok_or_else(|| format!("unknown state code '{value}'"))
}

fn parse_filing_status(value: &str) -> Result<FilingStatus, String> {
    FilingStatus::parse(value)
        .ok_or_else(|| format!("unknown filing status '{value}' (expected S, MFJ or HOH)"))
}

fn parse_method(value: &str) -> Result<SafeHarborMethod, String> {
    SafeHarborMethod::parse(value)
        .ok_or_else(|| format!("unknown method '{value}' (expected prior-year or current-year)"))
}
