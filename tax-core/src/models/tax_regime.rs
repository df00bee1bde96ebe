use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tax_bracket::{BracketTable, BracketTableError};

/// A jurisdiction that taxes every dollar at one rate.
///
/// Deserializing goes through [`FlatRatePolicy::try_new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFlatRate")]
pub struct FlatRatePolicy {
    pub rate: Decimal,
}

#[derive(Deserialize)]
struct RawFlatRate {
    rate: Decimal,
}

impl TryFrom<RawFlatRate> for FlatRatePolicy {
    type Error = BracketTableError;

    fn try_from(raw: RawFlatRate) -> Result<Self, Self::Error> {
        Self::try_new(raw.rate)
    }
}

impl FlatRatePolicy {
    /// Builds a flat policy, rejecting rates outside `[0, 1]`.
    pub fn try_new(rate: Decimal) -> Result<Self, BracketTableError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(BracketTableError::RateOutOfRange { index: 0, rate });
        }
        Ok(Self { rate })
    }
}

/// How a jurisdiction taxes income.
///
/// Callers match on this exhaustively; there is no implicit "brackets if
/// present, otherwise rate" fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegime {
    Progressive(BracketTable),
    Flat(FlatRatePolicy),
    None,
}

impl TaxRegime {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Progressive(_) => "progressive",
            Self::Flat(_) => "flat",
            Self::None => "none",
        }
    }

    /// Highest rate the regime can apply.
    pub fn top_rate(&self) -> Decimal {
        match self {
            Self::Progressive(table) => table.top_rate(),
            Self::Flat(policy) => policy.rate,
            Self::None => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::TaxBracket;

    #[test]
    fn flat_policy_rejects_rate_above_one() {
        assert_eq!(
            FlatRatePolicy::try_new(dec!(1.01)),
            Err(BracketTableError::RateOutOfRange {
                index: 0,
                rate: dec!(1.01)
            })
        );
    }

    #[test]
    fn flat_policy_accepts_zero() {
        assert_eq!(
            FlatRatePolicy::try_new(dec!(0)),
            Ok(FlatRatePolicy { rate: dec!(0) })
        );
    }

    #[test]
    fn deserialize_rejects_rate_above_one() {
        let err = serde_json::from_str::<TaxRegime>(r#"{"flat":{"rate":"1.5"}}"#)
            .expect_err("rate above one should not deserialize");

        assert!(err.to_string().contains("expected a value between 0 and 1"), "got: {err}");
    }

    #[test]
    fn deserialize_accepts_valid_flat_rate() {
        let regime: TaxRegime =
            serde_json::from_str(r#"{"flat":{"rate":"0.0495"}}"#).expect("valid flat rate");

        assert_eq!(regime, TaxRegime::Flat(FlatRatePolicy { rate: dec!(0.0495) }));
    }

    #[test]
    fn top_rate_per_regime() {
        let table = BracketTable::try_new(vec![
            TaxBracket::bounded(dec!(10000), dec!(0.02)),
            TaxBracket::unbounded(dec!(0.06)),
        ])
        .unwrap();

        assert_eq!(TaxRegime::Progressive(table).top_rate(), dec!(0.06));
        assert_eq!(
            TaxRegime::Flat(FlatRatePolicy { rate: dec!(0.0495) }).top_rate(),
            dec!(0.0495)
        );
        assert_eq!(TaxRegime::None.top_rate(), dec!(0));
    }
}
