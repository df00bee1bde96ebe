use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One slice of a progressive schedule.
///
/// `upper_bound` is the top of the slice; `None` marks the unbounded top
/// bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn bounded(
        upper_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Self {
            upper_bound: None,
            rate,
        }
    }
}

/// Errors raised when a bracket table fails validation.
///
/// These are configuration errors and are meant to surface while reference
/// data is loaded, never during a calculation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("bracket table is empty")]
    Empty,

    #[error("bracket {index} has rate {rate}, expected a value between 0 and 1")]
    RateOutOfRange { index: usize, rate: Decimal },

    #[error("bracket {index} upper bound {bound} does not exceed the previous bound {previous}")]
    NonIncreasingBound {
        index: usize,
        bound: Decimal,
        previous: Decimal,
    },

    #[error("bracket {index} is unbounded but is not the last bracket")]
    UnboundedNotLast { index: usize },

    #[error("last bracket must be unbounded")]
    MissingUnboundedTop,
}

/// An ordered, validated progressive schedule.
///
/// The only way to build one is [`BracketTable::try_new`] (or deserializing,
/// which goes through the same check), so every table handed to the
/// calculators satisfies:
///
/// - at least one bracket
/// - every rate in `[0, 1]`
/// - upper bounds positive and strictly increasing
/// - exactly one unbounded bracket, in last position
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::{BracketTable, BracketTableError, TaxBracket};
///
/// let table = BracketTable::try_new(vec![
///     TaxBracket::bounded(dec!(10000), dec!(0.10)),
///     TaxBracket::unbounded(dec!(0.20)),
/// ])
/// .unwrap();
/// assert_eq!(table.len(), 2);
///
/// let missing_top = BracketTable::try_new(vec![TaxBracket::bounded(dec!(10000), dec!(0.10))]);
/// assert_eq!(missing_top, Err(BracketTableError::MissingUnboundedTop));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct BracketTable {
    brackets: Vec<TaxBracket>,
}

impl BracketTable {
    pub fn try_new(brackets: Vec<TaxBracket>) -> Result<Self, BracketTableError> {
        if brackets.is_empty() {
            return Err(BracketTableError::Empty);
        }

        let last = brackets.len() - 1;
        let mut previous = Decimal::ZERO;

        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(BracketTableError::RateOutOfRange {
                    index,
                    rate: bracket.rate,
                });
            }

            match bracket.upper_bound {
                Some(bound) if bound <= previous => {
                    return Err(BracketTableError::NonIncreasingBound {
                        index,
                        bound,
                        previous,
                    });
                }
                Some(bound) => previous = bound,
                None if index != last => {
                    return Err(BracketTableError::UnboundedNotLast { index });
                }
                None => {}
            }
        }

        if brackets[last].upper_bound.is_some() {
            return Err(BracketTableError::MissingUnboundedTop);
        }

        Ok(Self { brackets })
    }

    /// A single unbounded bracket taxing everything at `rate`.
    pub fn single_rate(rate: Decimal) -> Result<Self, BracketTableError> {
        Self::try_new(vec![TaxBracket::unbounded(rate)])
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    /// Rate of the unbounded top bracket.
    pub fn top_rate(&self) -> Decimal {
        self.brackets
            .last()
            .map_or(Decimal::ZERO, |bracket| bracket.rate)
    }
}

impl TryFrom<Vec<TaxBracket>> for BracketTable {
    type Error = BracketTableError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        Self::try_new(brackets)
    }
}

impl From<BracketTable> for Vec<TaxBracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn try_new_accepts_ordered_table() {
        let table = BracketTable::try_new(vec![
            TaxBracket::bounded(dec!(11600), dec!(0.10)),
            TaxBracket::bounded(dec!(47150), dec!(0.12)),
            TaxBracket::unbounded(dec!(0.22)),
        ]);

        assert!(table.is_ok());
        assert_eq!(table.unwrap().top_rate(), dec!(0.22));
    }

    #[test]
    fn try_new_rejects_empty_table() {
        assert_eq!(BracketTable::try_new(vec![]), Err(BracketTableError::Empty));
    }

    #[test]
    fn try_new_rejects_rate_above_one() {
        let result = BracketTable::try_new(vec![
            TaxBracket::bounded(dec!(1000), dec!(0.10)),
            TaxBracket::unbounded(dec!(1.5)),
        ]);

        assert_eq!(
            result,
            Err(BracketTableError::RateOutOfRange {
                index: 1,
                rate: dec!(1.5)
            })
        );
    }

    #[test]
    fn try_new_rejects_negative_rate() {
        let result = BracketTable::try_new(vec![TaxBracket::unbounded(dec!(-0.01))]);

        assert_eq!(
            result,
            Err(BracketTableError::RateOutOfRange {
                index: 0,
                rate: dec!(-0.01)
            })
        );
    }

    #[test]
    fn try_new_rejects_out_of_order_bounds() {
        let result = BracketTable::try_new(vec![
            TaxBracket::bounded(dec!(5000), dec!(0.10)),
            TaxBracket::bounded(dec!(5000), dec!(0.12)),
            TaxBracket::unbounded(dec!(0.22)),
        ]);

        assert_eq!(
            result,
            Err(BracketTableError::NonIncreasingBound {
                index: 1,
                bound: dec!(5000),
                previous: dec!(5000),
            })
        );
    }

    #[test]
    fn try_new_rejects_zero_first_bound() {
        let result = BracketTable::try_new(vec![
            TaxBracket::bounded(dec!(0), dec!(0.10)),
            TaxBracket::unbounded(dec!(0.22)),
        ]);

        assert!(matches!(
            result,
            Err(BracketTableError::NonIncreasingBound { index: 0, .. })
        ));
    }

    #[test]
    fn try_new_rejects_unbounded_in_the_middle() {
        let result = BracketTable::try_new(vec![
            TaxBracket::unbounded(dec!(0.10)),
            TaxBracket::unbounded(dec!(0.22)),
        ]);

        assert_eq!(result, Err(BracketTableError::UnboundedNotLast { index: 0 }));
    }

    #[test]
    fn try_new_rejects_missing_top_bracket() {
        let result = BracketTable::try_new(vec![
            TaxBracket::bounded(dec!(1000), dec!(0.10)),
            TaxBracket::bounded(dec!(2000), dec!(0.12)),
        ]);

        assert_eq!(result, Err(BracketTableError::MissingUnboundedTop));
    }

    #[test]
    fn single_rate_builds_one_unbounded_bracket() {
        let table = BracketTable::single_rate(dec!(0.05)).unwrap();

        assert_eq!(table.brackets(), &[TaxBracket::unbounded(dec!(0.05))]);
    }
}
