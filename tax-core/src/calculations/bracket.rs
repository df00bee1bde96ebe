//! Tax owed on an amount under a progressive schedule or a flat rate.
//!
//! The progressive walk taxes only the slice of income that falls inside each
//! bracket, so crossing a bracket edge never re-taxes the income below it.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::compute_bracket_tax;
//! use tax_core::{BracketTable, FlatRatePolicy, TaxBracket, TaxRegime};
//!
//! let single = TaxRegime::Progressive(
//!     BracketTable::try_new(vec![
//!         TaxBracket::bounded(dec!(11600), dec!(0.10)),
//!         TaxBracket::bounded(dec!(47150), dec!(0.12)),
//!         TaxBracket::bounded(dec!(100525), dec!(0.22)),
//!         TaxBracket::unbounded(dec!(0.24)),
//!     ])
//!     .unwrap(),
//! );
//!
//! // 1160 + 4266 + 2827
//! assert_eq!(compute_bracket_tax(dec!(60000), &single), dec!(8253));
//!
//! let flat = TaxRegime::Flat(FlatRatePolicy { rate: dec!(0.05) });
//! assert_eq!(compute_bracket_tax(dec!(80000), &flat), dec!(4000));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::non_negative;
use crate::{BracketTable, FlatRatePolicy, TaxRegime};

/// Tax owed on `taxable_amount` under `regime`.
///
/// Callers are expected to floor taxable amounts at zero before calling; a
/// negative amount is logged and treated as zero. The result is never
/// rounded.
pub fn compute_bracket_tax(
    taxable_amount: Decimal,
    regime: &TaxRegime,
) -> Decimal {
    let amount = clamp_taxable(taxable_amount);

    let tax = match regime {
        TaxRegime::Progressive(table) => progressive_tax(amount, table),
        TaxRegime::Flat(policy) => flat_tax(amount, policy),
        TaxRegime::None => Decimal::ZERO,
    };

    debug!(
        taxable_amount = %amount,
        regime = regime.kind(),
        tax = %tax,
        "Computed bracket tax"
    );

    tax
}

/// Walks the schedule from the bottom, taxing each bracket's slice.
pub fn progressive_tax(
    taxable_amount: Decimal,
    table: &BracketTable,
) -> Decimal {
    let amount = clamp_taxable(taxable_amount);
    let mut previous_upper_bound = Decimal::ZERO;
    let mut total = Decimal::ZERO;

    for bracket in table.brackets() {
        if amount <= previous_upper_bound {
            break;
        }

        let ceiling = bracket
            .upper_bound
            .map_or(amount, |bound| amount.min(bound));
        total += non_negative(ceiling - previous_upper_bound) * bracket.rate;

        match bracket.upper_bound {
            Some(bound) => previous_upper_bound = bound,
            None => break,
        }
    }

    total
}

pub fn flat_tax(
    taxable_amount: Decimal,
    policy: &FlatRatePolicy,
) -> Decimal {
    clamp_taxable(taxable_amount) * policy.rate
}

/// Rate applied to the last dollar of `taxable_amount`.
///
/// An amount sitting exactly on an upper bound belongs to that bracket.
pub fn marginal_rate(
    taxable_amount: Decimal,
    regime: &TaxRegime,
) -> Decimal {
    match regime {
        TaxRegime::Progressive(table) => table
            .brackets()
            .iter()
            .find(|bracket| {
                bracket
                    .upper_bound
                    .is_none_or(|bound| taxable_amount <= bound)
            })
            .map_or(Decimal::ZERO, |bracket| bracket.rate),
        TaxRegime::Flat(policy) => policy.rate,
        TaxRegime::None => Decimal::ZERO,
    }
}

/// The portion of an amount taxed inside one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlice {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub taxed_amount: Decimal,
    pub tax: Decimal,
}

/// Per-bracket view of [`progressive_tax`].
///
/// Only brackets the amount reaches are listed. The slice taxes add up to
/// `progressive_tax(taxable_amount, table)`.
pub fn bracket_breakdown(
    taxable_amount: Decimal,
    table: &BracketTable,
) -> Vec<BracketSlice> {
    let amount = clamp_taxable(taxable_amount);
    let mut previous_upper_bound = Decimal::ZERO;
    let mut slices = Vec::new();

    for bracket in table.brackets() {
        if amount <= previous_upper_bound {
            break;
        }

        let ceiling = bracket
            .upper_bound
            .map_or(amount, |bound| amount.min(bound));
        let taxed_amount = non_negative(ceiling - previous_upper_bound);
        slices.push(BracketSlice {
            lower_bound: previous_upper_bound,
            upper_bound: bracket.upper_bound,
            rate: bracket.rate,
            taxed_amount,
            tax: taxed_amount * bracket.rate,
        });

        match bracket.upper_bound {
            Some(bound) => previous_upper_bound = bound,
            None => break,
        }
    }

    slices
}

fn clamp_taxable(amount: Decimal) -> Decimal {
    if amount < Decimal::ZERO {
        warn!(
            taxable_amount = %amount,
            "Negative taxable amount; treating as zero"
        );
        return Decimal::ZERO;
    }
    amount
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;
    use crate::TaxBracket;

    /// Routes warnings to the test writer so clamped inputs show up in output.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

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

    // =========================================================================
    // progressive_tax tests
    // =========================================================================

    #[test]
    fn progressive_tax_zero_income() {
        assert_eq!(progressive_tax(dec!(0), &single_2024()), dec!(0));
    }

    #[test]
    fn progressive_tax_first_bracket() {
        assert_eq!(progressive_tax(dec!(10000), &single_2024()), dec!(1000));
    }

    #[test]
    fn progressive_tax_exactly_on_first_bound() {
        assert_eq!(progressive_tax(dec!(11600), &single_2024()), dec!(1160));
    }

    #[test]
    fn progressive_tax_one_dollar_over_bound_taxes_only_that_dollar_higher() {
        let at_bound = progressive_tax(dec!(11600), &single_2024());
        let over = progressive_tax(dec!(11601), &single_2024());

        assert_eq!(over - at_bound, dec!(0.12));
    }

    #[test]
    fn progressive_tax_third_bracket() {
        // 11600 * 0.10 + 35550 * 0.12 + 12850 * 0.22
        assert_eq!(progressive_tax(dec!(60000), &single_2024()), dec!(8253));
    }

    #[test]
    fn progressive_tax_top_bracket() {
        // 1160 + 4266 + 11742.50 + 21942 + 16568 + 127968.75 + 90600.05
        assert_eq!(
            progressive_tax(dec!(854215), &single_2024()),
            dec!(274247.30)
        );
    }

    #[test]
    fn progressive_tax_treats_negative_as_zero() {
        let _guard = init_test_tracing();

        assert_eq!(progressive_tax(dec!(-500), &single_2024()), dec!(0));
    }

    // =========================================================================
    // compute_bracket_tax tests
    // =========================================================================

    #[test]
    fn compute_bracket_tax_flat() {
        let regime = TaxRegime::Flat(FlatRatePolicy { rate: dec!(0.05) });

        assert_eq!(compute_bracket_tax(dec!(80000), &regime), dec!(4000));
    }

    #[test]
    fn compute_bracket_tax_negative_amount_is_zero() {
        let _guard = init_test_tracing();
        let regime = TaxRegime::Flat(FlatRatePolicy { rate: dec!(0.05) });

        assert_eq!(compute_bracket_tax(dec!(-1000), &regime), dec!(0));
    }

    #[test]
    fn compute_bracket_tax_none_is_zero() {
        assert_eq!(compute_bracket_tax(dec!(80000), &TaxRegime::None), dec!(0));
    }

    #[test]
    fn compute_bracket_tax_single_bracket_matches_flat() {
        let progressive = TaxRegime::Progressive(BracketTable::single_rate(dec!(0.0307)).unwrap());
        let flat = TaxRegime::Flat(FlatRatePolicy { rate: dec!(0.0307) });

        for amount in [dec!(0), dec!(1), dec!(12345.67), dec!(1000000)] {
            assert_eq!(
                compute_bracket_tax(amount, &progressive),
                compute_bracket_tax(amount, &flat)
            );
        }
    }

    // =========================================================================
    // marginal_rate tests
    // =========================================================================

    #[test]
    fn marginal_rate_on_bound_uses_lower_bracket() {
        let regime = TaxRegime::Progressive(single_2024());

        assert_eq!(marginal_rate(dec!(47150), &regime), dec!(0.12));
        assert_eq!(marginal_rate(dec!(47150.01), &regime), dec!(0.22));
    }

    #[test]
    fn marginal_rate_top_bracket() {
        let regime = TaxRegime::Progressive(single_2024());

        assert_eq!(marginal_rate(dec!(5000000), &regime), dec!(0.37));
    }

    #[test]
    fn marginal_rate_zero_income_is_first_rate() {
        let regime = TaxRegime::Progressive(single_2024());

        assert_eq!(marginal_rate(dec!(0), &regime), dec!(0.10));
    }

    // =========================================================================
    // bracket_breakdown tests
    // =========================================================================

    #[test]
    fn bracket_breakdown_lists_reached_brackets() {
        let slices = bracket_breakdown(dec!(60000), &single_2024());

        assert_eq!(
            slices,
            vec![
                BracketSlice {
                    lower_bound: dec!(0),
                    upper_bound: Some(dec!(11600)),
                    rate: dec!(0.10),
                    taxed_amount: dec!(11600),
                    tax: dec!(1160),
                },
                BracketSlice {
                    lower_bound: dec!(11600),
                    upper_bound: Some(dec!(47150)),
                    rate: dec!(0.12),
                    taxed_amount: dec!(35550),
                    tax: dec!(4266),
                },
                BracketSlice {
                    lower_bound: dec!(47150),
                    upper_bound: Some(dec!(100525)),
                    rate: dec!(0.22),
                    taxed_amount: dec!(12850),
                    tax: dec!(2827),
                },
            ]
        );
    }

    #[test]
    fn bracket_breakdown_sums_to_progressive_tax() {
        let table = single_2024();

        for amount in [dec!(500), dec!(47150), dec!(250000.55), dec!(2000000)] {
            let total: Decimal = bracket_breakdown(amount, &table)
                .iter()
                .map(|slice| slice.tax)
                .sum();
            assert_eq!(total, progressive_tax(amount, &table));
        }
    }

    #[test]
    fn bracket_breakdown_zero_income_is_empty() {
        assert!(bracket_breakdown(dec!(0), &single_2024()).is_empty());
    }
}
