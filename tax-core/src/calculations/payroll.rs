//! Take-home pay for a W-2 earner.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Total gross = wages + bonus |
//! | 2    | Pre-tax deductions = retirement contribution + health premium |
//! | 3    | Taxable gross = total gross - pre-tax deductions (minimum 0) |
//! | 4    | Federal tax on taxable gross, using the filing-status schedule |
//! | 5    | Payroll tax = min(total gross, wage cap) × SS rate + total gross × Medicare rate |
//! | 6    | State taxable = taxable gross - state standard deduction (minimum 0) |
//! | 7    | State tax under the state's regime, less selected credits (minimum 0) |
//! | 8    | Total tax = federal + payroll + state |
//! | 9    | Net pay = total gross - total tax - pre-tax deductions |
//! | 10   | Effective rate = total tax / total gross (0 when gross is 0) |
//!
//! Only the social security share of payroll tax stops at the wage cap;
//! Medicare applies to every dollar.
//!
//! Income sums saturate at [`Decimal::MAX`] instead of overflowing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::bracket::{compute_bracket_tax, marginal_rate, progressive_tax};
use crate::calculations::common::{non_negative, ratio_or_zero};
use crate::{IncomeProfile, JurisdictionTable, PayrollTaxConfig, StatePolicy, TaxRegime};

const MONTHS_PER_YEAR: i64 = 12;

/// Biweekly pay.
pub const DEFAULT_PAY_PERIODS: u32 = 26;

/// Breakdown of a paycheck calculation. Amounts are unrounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollResult {
    pub total_gross: Decimal,
    pub pre_tax_deductions: Decimal,
    pub taxable_income: Decimal,

    pub federal_tax: Decimal,
    pub federal_marginal_rate: Decimal,

    pub social_security_tax: Decimal,
    pub medicare_tax: Decimal,
    pub payroll_tax: Decimal,

    pub state_taxable_income: Decimal,
    pub state_tax_before_credits: Decimal,
    pub state_credits_applied: Decimal,
    pub state_tax: Decimal,

    pub total_tax: Decimal,
    pub net_pay: Decimal,
    pub monthly_net_pay: Decimal,
    pub effective_rate: Decimal,

    /// Retirement contribution is above the annual limit.
    pub exceeds_retirement_limit: bool,
}

impl PayrollResult {
    /// Net pay for one of `pay_periods` equal paychecks; zero periods yields
    /// zero.
    pub fn per_period_net_pay(
        &self,
        pay_periods: u32,
    ) -> Decimal {
        ratio_or_zero(self.net_pay, Decimal::from(pay_periods))
    }

    /// Gross pay for one of `pay_periods` equal paychecks.
    pub fn per_period_gross(
        &self,
        pay_periods: u32,
    ) -> Decimal {
        ratio_or_zero(self.total_gross, Decimal::from(pay_periods))
    }
}

/// Paycheck calculator bound to one year's reference data.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
///
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::PayrollCalculator;
/// use tax_core::{
///     BracketTable, FederalBrackets, FilingStatus, IncomeProfile, JurisdictionTable,
///     PayrollTaxConfig, StateCode, TaxBracket,
/// };
///
/// let schedule = BracketTable::try_new(vec![
///     TaxBracket::bounded(dec!(11600), dec!(0.10)),
///     TaxBracket::bounded(dec!(47150), dec!(0.12)),
///     TaxBracket::unbounded(dec!(0.22)),
/// ])
/// .unwrap();
/// let jurisdictions = JurisdictionTable::new(
///     2024,
///     FederalBrackets {
///         single: schedule.clone(),
///         married_filing_jointly: schedule.clone(),
///         head_of_household: schedule,
///     },
///     BTreeMap::new(),
/// );
/// let payroll = PayrollTaxConfig {
///     social_security_wage_cap: dec!(168600),
///     social_security_rate: dec!(0.062),
///     medicare_rate: dec!(0.0145),
///     retirement_contribution_limit: dec!(23000),
/// };
///
/// let calculator = PayrollCalculator::new(&jurisdictions, &payroll);
/// let profile = IncomeProfile::wages_only(dec!(60000), FilingStatus::Single, StateCode::Texas);
/// let result = calculator.compute_net_pay(&profile);
///
/// assert_eq!(result.federal_tax, dec!(8253));
/// assert_eq!(result.payroll_tax, dec!(4590));
/// assert_eq!(result.state_tax, dec!(0));
/// assert_eq!(result.net_pay, dec!(47157));
/// ```
#[derive(Debug, Clone)]
pub struct PayrollCalculator<'a> {
    jurisdictions: &'a JurisdictionTable,
    config: &'a PayrollTaxConfig,
}

impl<'a> PayrollCalculator<'a> {
    pub fn new(
        jurisdictions: &'a JurisdictionTable,
        config: &'a PayrollTaxConfig,
    ) -> Self {
        Self {
            jurisdictions,
            config,
        }
    }

    /// Runs every step for `profile`. Never fails: negative intermediate
    /// amounts are floored at zero.
    pub fn compute_net_pay(
        &self,
        profile: &IncomeProfile,
    ) -> PayrollResult {
        let total_gross = self.total_gross(profile);
        let pre_tax_deductions = self.pre_tax_deductions(profile);
        let taxable_income = self.taxable_gross(total_gross, pre_tax_deductions);

        let federal_schedule = self.jurisdictions.federal.for_status(profile.filing_status);
        let federal_tax = progressive_tax(taxable_income, federal_schedule);
        let federal_marginal_rate = marginal_rate(
            taxable_income,
            &TaxRegime::Progressive(federal_schedule.clone()),
        );

        let social_security_tax = self.social_security_tax(total_gross);
        let medicare_tax = self.medicare_tax(total_gross);
        let payroll_tax = social_security_tax + medicare_tax;

        let state = self.jurisdictions.state(profile.state);
        let state_taxable_income = self.state_taxable(taxable_income, state);
        let state_tax_before_credits = compute_bracket_tax(state_taxable_income, &state.regime);
        let state_credits_applied = self.state_credits(state, &profile.selected_credits);
        let state_tax = non_negative(state_tax_before_credits - state_credits_applied);

        let total_tax = federal_tax + payroll_tax + state_tax;
        let net_pay = total_gross - total_tax - pre_tax_deductions;
        let monthly_net_pay = net_pay / Decimal::from(MONTHS_PER_YEAR);
        let effective_rate = ratio_or_zero(total_tax, total_gross);

        let exceeds_retirement_limit =
            profile.retirement_contribution > self.config.retirement_contribution_limit;
        if exceeds_retirement_limit {
            warn!(
                contribution = %profile.retirement_contribution,
                limit = %self.config.retirement_contribution_limit,
                "Retirement contribution exceeds the annual limit"
            );
        }

        debug!(
            state = %profile.state,
            filing_status = profile.filing_status.as_str(),
            total_gross = %total_gross,
            total_tax = %total_tax,
            net_pay = %net_pay,
            "Computed net pay"
        );

        PayrollResult {
            total_gross,
            pre_tax_deductions,
            taxable_income,
            federal_tax,
            federal_marginal_rate,
            social_security_tax,
            medicare_tax,
            payroll_tax,
            state_taxable_income,
            state_tax_before_credits,
            state_credits_applied,
            state_tax,
            total_tax,
            net_pay,
            monthly_net_pay,
            effective_rate,
            exceeds_retirement_limit,
        }
    }

    fn total_gross(
        &self,
        profile: &IncomeProfile,
    ) -> Decimal {
        profile.wages.saturating_add(profile.bonus)
    }

    fn pre_tax_deductions(
        &self,
        profile: &IncomeProfile,
    ) -> Decimal {
        profile
            .retirement_contribution
            .saturating_add(profile.health_insurance_premium)
    }

    fn taxable_gross(
        &self,
        total_gross: Decimal,
        pre_tax_deductions: Decimal,
    ) -> Decimal {
        non_negative(total_gross.saturating_sub(pre_tax_deductions))
    }

    /// Social security share; wages above the cap are not taxed.
    fn social_security_tax(
        &self,
        total_gross: Decimal,
    ) -> Decimal {
        let capped = non_negative(total_gross).min(self.config.social_security_wage_cap);
        capped * self.config.social_security_rate
    }

    /// Medicare share; uncapped.
    fn medicare_tax(
        &self,
        total_gross: Decimal,
    ) -> Decimal {
        non_negative(total_gross) * self.config.medicare_rate
    }

    fn state_taxable(
        &self,
        taxable_gross: Decimal,
        state: &StatePolicy,
    ) -> Decimal {
        non_negative(taxable_gross - state.standard_deduction)
    }

    fn state_credits(
        &self,
        state: &StatePolicy,
        selected: &[String],
    ) -> Decimal {
        for id in selected {
            if !state.credits.iter().any(|credit| credit.id == *id) {
                debug!(credit = %id, state = %state.name, "Ignoring credit not offered by state");
            }
        }
        state.selected_credits_total(selected)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        BracketTable, FederalBrackets, FilingStatus, FlatRatePolicy, StateCode, StateCredit,
        TaxBracket,
    };

    fn single_2024() -> BracketTable {
        BracketTable::try_new(vec![
            TaxBracket::bounded(dec!(11600), dec!(0.10)),
            TaxBracket::bounded(dec!(47150), dec!(0.12)),
            TaxBracket::bounded(dec!(100525), dec!(0.22)),
            TaxBracket::bounded(dec!(191950), dec!(0.24)),
            TaxBracket::bounded(dec!(243725), dec!(0.32)),
            TaxBracket::bounded(dec!(609350), dec!(0.35)),
            TaxBracket::unbounded(dec!(0.37)),
        ])
        .unwrap()
    }

    fn married_2024() -> BracketTable {
        BracketTable::try_new(vec![
            TaxBracket::bounded(dec!(23200), dec!(0.10)),
            TaxBracket::bounded(dec!(94300), dec!(0.12)),
            TaxBracket::bounded(dec!(201050), dec!(0.22)),
            TaxBracket::bounded(dec!(383900), dec!(0.24)),
            TaxBracket::bounded(dec!(487450), dec!(0.32)),
            TaxBracket::bounded(dec!(731200), dec!(0.35)),
            TaxBracket::unbounded(dec!(0.37)),
        ])
        .unwrap()
    }

    fn test_jurisdictions() -> JurisdictionTable {
        let mut states = BTreeMap::new();
        states.insert(
            StateCode::Illinois,
            StatePolicy {
                name: "Illinois".to_string(),
                regime: TaxRegime::Flat(FlatRatePolicy { rate: dec!(0.05) }),
                standard_deduction: dec!(0),
                estimated_rate: dec!(0.0495),
                credits: vec![],
            },
        );
        states.insert(
            StateCode::California,
            StatePolicy {
                name: "California".to_string(),
                regime: TaxRegime::Progressive(
                    BracketTable::try_new(vec![
                        TaxBracket::bounded(dec!(10000), dec!(0.01)),
                        TaxBracket::bounded(dec!(50000), dec!(0.04)),
                        TaxBracket::unbounded(dec!(0.093)),
                    ])
                    .unwrap(),
                ),
                standard_deduction: dec!(5000),
                estimated_rate: dec!(0.093),
                credits: vec![StateCredit {
                    id: "ca_renter".to_string(),
                    label: "Renter's Credit".to_string(),
                    amount: dec!(60),
                    description: String::new(),
                }],
            },
        );
        states.insert(
            StateCode::Texas,
            StatePolicy {
                name: "Texas".to_string(),
                ..StatePolicy::no_income_tax()
            },
        );

        JurisdictionTable::new(
            2024,
            FederalBrackets {
                single: single_2024(),
                married_filing_jointly: married_2024(),
                head_of_household: single_2024(),
            },
            states,
        )
    }

    fn test_config() -> PayrollTaxConfig {
        PayrollTaxConfig {
            social_security_wage_cap: dec!(168600),
            social_security_rate: dec!(0.062),
            medicare_rate: dec!(0.0145),
            retirement_contribution_limit: dec!(23000),
        }
    }

    fn profile(
        wages: Decimal,
        state: StateCode,
    ) -> IncomeProfile {
        IncomeProfile::wages_only(wages, FilingStatus::Single, state)
    }

    // =========================================================================
    // step tests
    // =========================================================================

    #[test]
    fn taxable_gross_floors_at_zero() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        assert_eq!(calculator.taxable_gross(dec!(10000), dec!(15000)), dec!(0));
    }

    #[test]
    fn social_security_tax_below_cap() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        assert_eq!(calculator.social_security_tax(dec!(100000)), dec!(6200));
    }

    #[test]
    fn social_security_tax_stops_at_cap() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        // 168600 * 0.062
        assert_eq!(calculator.social_security_tax(dec!(500000)), dec!(10453.2));
    }

    #[test]
    fn medicare_tax_is_uncapped() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        assert_eq!(calculator.medicare_tax(dec!(500000)), dec!(7250));
    }

    #[test]
    fn payroll_taxes_ignore_negative_gross() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        assert_eq!(calculator.social_security_tax(dec!(-100)), dec!(0));
        assert_eq!(calculator.medicare_tax(dec!(-100)), dec!(0));
    }

    // =========================================================================
    // compute_net_pay tests
    // =========================================================================

    #[test]
    fn compute_net_pay_no_income_tax_state() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        let result = calculator.compute_net_pay(&profile(dec!(60000), StateCode::Texas));

        assert_eq!(result.total_gross, dec!(60000));
        assert_eq!(result.taxable_income, dec!(60000));
        assert_eq!(result.federal_tax, dec!(8253));
        assert_eq!(result.social_security_tax, dec!(3720));
        assert_eq!(result.medicare_tax, dec!(870));
        assert_eq!(result.state_tax, dec!(0));
        assert_eq!(result.total_tax, dec!(12843));
        assert_eq!(result.net_pay, dec!(47157));
        assert_eq!(result.monthly_net_pay, dec!(3929.75));
        assert_eq!(result.effective_rate, dec!(0.21405));
        assert_eq!(result.federal_marginal_rate, dec!(0.22));
    }

    #[test]
    fn compute_net_pay_with_bonus_and_deductions() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);
        let profile = IncomeProfile {
            bonus: dec!(10000),
            retirement_contribution: dec!(7600),
            health_insurance_premium: dec!(2400),
            ..profile(dec!(60000), StateCode::Illinois)
        };

        let result = calculator.compute_net_pay(&profile);

        assert_eq!(result.total_gross, dec!(70000));
        assert_eq!(result.pre_tax_deductions, dec!(10000));
        assert_eq!(result.taxable_income, dec!(60000));
        assert_eq!(result.federal_tax, dec!(8253));
        // Payroll tax is on total gross, before pre-tax deductions
        assert_eq!(result.payroll_tax, dec!(5355));
        assert_eq!(result.state_tax, dec!(3000));
        assert_eq!(result.total_tax, dec!(16608));
        assert_eq!(result.net_pay, dec!(43392));
    }

    #[test]
    fn compute_net_pay_progressive_state_after_standard_deduction() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        let result = calculator.compute_net_pay(&profile(dec!(80000), StateCode::California));

        assert_eq!(result.state_taxable_income, dec!(75000));
        // 10000 * 0.01 + 40000 * 0.04 + 25000 * 0.093
        assert_eq!(result.state_tax_before_credits, dec!(4025));
        assert_eq!(result.state_tax, dec!(4025));
    }

    #[test]
    fn compute_net_pay_applies_selected_state_credit() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);
        let profile = IncomeProfile {
            selected_credits: vec!["ca_renter".to_string(), "ny_household".to_string()],
            ..profile(dec!(80000), StateCode::California)
        };

        let result = calculator.compute_net_pay(&profile);

        assert_eq!(result.state_credits_applied, dec!(60));
        assert_eq!(result.state_tax, dec!(3965));
    }

    #[test]
    fn compute_net_pay_credit_cannot_make_state_tax_negative() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);
        let profile = IncomeProfile {
            selected_credits: vec!["ca_renter".to_string()],
            ..profile(dec!(6000), StateCode::California)
        };

        let result = calculator.compute_net_pay(&profile);

        // 1000 taxable at 1%
        assert_eq!(result.state_tax_before_credits, dec!(10));
        assert_eq!(result.state_tax, dec!(0));
    }

    #[test]
    fn compute_net_pay_unknown_state_pays_no_state_tax() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        let result = calculator.compute_net_pay(&profile(dec!(80000), StateCode::Oregon));

        assert_eq!(result.state_tax, dec!(0));
    }

    #[test]
    fn compute_net_pay_uses_filing_status_schedule() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);
        let profile = IncomeProfile {
            filing_status: FilingStatus::MarriedFilingJointly,
            ..profile(dec!(60000), StateCode::Texas)
        };

        let result = calculator.compute_net_pay(&profile);

        // 23200 * 0.10 + 36800 * 0.12
        assert_eq!(result.federal_tax, dec!(6736));
        assert_eq!(result.federal_marginal_rate, dec!(0.12));
    }

    #[test]
    fn compute_net_pay_zero_income() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        let result = calculator.compute_net_pay(&profile(dec!(0), StateCode::California));

        assert_eq!(result.total_tax, dec!(0));
        assert_eq!(result.net_pay, dec!(0));
        assert_eq!(result.effective_rate, dec!(0));
    }

    #[test]
    fn compute_net_pay_flags_excess_retirement_contribution() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);
        let profile = IncomeProfile {
            retirement_contribution: dec!(23000.01),
            ..profile(dec!(120000), StateCode::Texas)
        };

        let result = calculator.compute_net_pay(&profile);

        assert!(result.exceeds_retirement_limit);
    }

    #[test]
    fn compute_net_pay_saturates_instead_of_overflowing() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);
        let profile = IncomeProfile {
            bonus: dec!(1),
            ..profile(Decimal::MAX, StateCode::Texas)
        };

        let result = calculator.compute_net_pay(&profile);

        assert_eq!(result.total_gross, Decimal::MAX);
        assert!(result.net_pay > Decimal::ZERO);
        assert!(result.total_tax < result.total_gross);
    }

    #[test]
    fn per_period_divides_by_pay_periods() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        let result = calculator.compute_net_pay(&profile(dec!(60000), StateCode::Texas));

        // 47157 / 26
        assert_eq!(result.per_period_net_pay(26), dec!(47157) / dec!(26));
        assert_eq!(result.per_period_gross(DEFAULT_PAY_PERIODS), dec!(60000) / dec!(26));
        assert_eq!(result.per_period_net_pay(12), result.monthly_net_pay);
    }

    #[test]
    fn per_period_zero_periods_is_zero() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);

        let result = calculator.compute_net_pay(&profile(dec!(60000), StateCode::Texas));

        assert_eq!(result.per_period_net_pay(0), dec!(0));
        assert_eq!(result.per_period_gross(0), dec!(0));
    }

    #[test]
    fn compute_net_pay_is_deterministic() {
        let jurisdictions = test_jurisdictions();
        let config = test_config();
        let calculator = PayrollCalculator::new(&jurisdictions, &config);
        let profile = profile(dec!(123456.78), StateCode::California);

        assert_eq!(
            calculator.compute_net_pay(&profile),
            calculator.compute_net_pay(&profile)
        );
    }
}
