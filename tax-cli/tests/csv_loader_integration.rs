//! Exercises the loader and the batch command against an on-disk fixture.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_cli::app;
use tax_cli::cli::{BatchArgs, Command};
use tax_cli::csv_loader;
use tax_cli::report::Report;
use tax_core::{FilingStatus, SafeHarborMethod, StateCode};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample_profiles.csv")
}

#[test]
fn test_load_fixture_file_succeeds() {
    let profiles =
        csv_loader::load_from_file(&fixture_path()).expect("fixture file should load without error");

    assert_eq!(profiles.len(), 5);
}

#[test]
fn test_load_fixture_optional_columns() {
    let profiles = csv_loader::load_from_file(&fixture_path()).expect("fixture should load");

    assert_eq!(profiles[0].profile.bonus, dec!(0));
    assert!(profiles[0].profile.selected_credits.is_empty());
    assert_eq!(profiles[1].profile.selected_credits, vec!["ca_renter"]);
    assert_eq!(profiles[2].profile.filing_status, FilingStatus::MarriedFilingJointly);

    let hoh = &profiles[3].profile;
    assert_eq!(hoh.filing_status, FilingStatus::HeadOfHousehold);
    assert_eq!(hoh.state, StateCode::Illinois);
    assert_eq!(hoh.bonus, dec!(3000.00));
    // 5% of wages
    assert_eq!(hoh.retirement_contribution, dec!(3600));
    assert_eq!(hoh.health_insurance_premium, dec!(1200.00));

    let freelancer = &profiles[4];
    assert_eq!(freelancer.profile.self_employment_gross, dec!(100000.00));
    assert_eq!(freelancer.prior_year.prior_year_tax, dec!(22000.00));
}

#[test]
fn test_load_nonexistent_file_returns_io_error() {
    let result = csv_loader::load_from_file(&fixture_path().with_file_name("missing.csv"));

    assert!(matches!(result, Err(csv_loader::CsvLoadError::Io { .. })));
}

#[test]
fn test_batch_report_rounds_each_row() {
    let data = app::load_data(None).expect("bundled data should load");
    let command = Command::Batch(BatchArgs {
        file: fixture_path(),
        method: SafeHarborMethod::PriorYear,
    });

    let report = app::run(&command, &data).expect("batch should run");

    let Report::Batch(batch) = report else {
        panic!("expected batch report");
    };
    assert_eq!(batch.rows.len(), 5);
    assert_eq!(batch.rows[0].row, 1);
    assert_eq!(batch.rows[0].paycheck.net_pay, dec!(47296.00));
    assert_eq!(batch.rows[1].paycheck.state_tax, dec!(3423.60));
    assert_eq!(batch.rows[1].paycheck.net_pay, dec!(57942.40));
    assert_eq!(batch.rows[2].paycheck.federal_tax, dec!(22828.00));
}

#[test]
fn test_batch_estimates_quarterly_payments_for_self_employment_rows() {
    let data = app::load_data(None).expect("bundled data should load");
    let command = Command::Batch(BatchArgs {
        file: fixture_path(),
        method: SafeHarborMethod::PriorYear,
    });

    let Report::Batch(batch) = app::run(&command, &data).expect("batch should run") else {
        panic!("expected batch report");
    };

    assert!(batch.rows[..4].iter().all(|row| row.quarterly.is_none()));
    let quarterly = batch.rows[4]
        .quarterly
        .as_ref()
        .expect("self-employment row should get an estimate");
    assert_eq!(quarterly.net_business_income, dec!(80000.00));
    assert_eq!(quarterly.quarterly_payment, dec!(5500.00));
    assert_eq!(quarterly.schedule.len(), 4);
    assert!(batch.to_string().contains("$5500.00"));
}

#[test]
fn test_batch_report_serializes_flat_rows() {
    let data = app::load_data(None).expect("bundled data should load");
    let command = Command::Batch(BatchArgs {
        file: fixture_path(),
        method: SafeHarborMethod::PriorYear,
    });
    let report = app::run(&command, &data).expect("batch should run");

    let json = serde_json::to_value(&report).expect("report should serialize");

    assert_eq!(json["rows"][0]["row"], 1);
    assert_eq!(json["rows"][0]["state"], "TX");
    assert_eq!(json["rows"][2]["filing_status"], "Married Filing Jointly");
    assert!(json["rows"][0].get("quarterly").is_none());
    assert_eq!(json["rows"][4]["quarterly"]["selected_method"], "prior_year");
}
