//! Shared helpers for the calculators.
//!
//! The calculators never round; [`round_half_up`] is for callers presenting
//! results in whole cents.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents, with midpoints rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(2827.004)), dec!(2827.00));
/// assert_eq!(round_half_up(dec!(2827.005)), dec!(2827.01));
/// assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Floors a value at zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-250.00)), dec!(0));
/// assert_eq!(non_negative(dec!(250.00)), dec!(250.00));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// `numerator / denominator`, or zero when the denominator is not positive.
///
/// A quotient too large for [`Decimal`] saturates at its bounds.
pub fn ratio_or_zero(
    numerator: Decimal,
    denominator: Decimal,
) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(if numerator.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}
