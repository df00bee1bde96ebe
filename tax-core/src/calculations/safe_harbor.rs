//! Safe-harbor thresholds for estimated tax payments.
//!
//! Paying at least one of two thresholds during the year avoids the
//! underpayment penalty:
//!
//! | Basis        | Threshold |
//! |--------------|-----------|
//! | Prior year   | prior-year tax × 100% (110% when prior-year AGI exceeds the high-earner threshold) |
//! | Current year | current-year liability × 90% |
//!
//! Meeting either is enough, so the smaller one is recommended.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::non_negative;
use crate::{SafeHarborConfig, SafeHarborInputs, SafeHarborMethod};

/// Both safe-harbor thresholds and the recommended one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeHarborEvaluation {
    pub is_high_earner: bool,
    pub prior_year_safe_harbor: Decimal,
    pub current_year_safe_harbor: Decimal,
    /// Always `min(prior_year_safe_harbor, current_year_safe_harbor)`.
    pub recommended_safe_harbor: Decimal,
    pub recommended_method: SafeHarborMethod,
}

impl SafeHarborEvaluation {
    pub fn basis(
        &self,
        method: SafeHarborMethod,
    ) -> Decimal {
        match method {
            SafeHarborMethod::PriorYear => self.prior_year_safe_harbor,
            SafeHarborMethod::CurrentYear => self.current_year_safe_harbor,
        }
    }
}

/// Evaluates safe-harbor thresholds under one configuration.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::SafeHarborRule;
/// use tax_core::{SafeHarborConfig, SafeHarborInputs, SafeHarborMethod};
///
/// let config = SafeHarborConfig::default();
/// let rule = SafeHarborRule::new(&config);
/// let inputs = SafeHarborInputs {
///     prior_year_tax: dec!(22000),
///     prior_year_agi: dec!(100000),
/// };
///
/// let evaluation = rule.evaluate(&inputs, dec!(30000));
///
/// assert!(!evaluation.is_high_earner);
/// assert_eq!(evaluation.prior_year_safe_harbor, dec!(22000));
/// assert_eq!(evaluation.current_year_safe_harbor, dec!(27000));
/// assert_eq!(evaluation.recommended_method, SafeHarborMethod::PriorYear);
/// ```
#[derive(Debug, Clone)]
pub struct SafeHarborRule<'a> {
    config: &'a SafeHarborConfig,
}

impl<'a> SafeHarborRule<'a> {
    pub fn new(config: &'a SafeHarborConfig) -> Self {
        Self { config }
    }

    /// Computes both thresholds for a projected current-year liability.
    ///
    /// High-earner status depends only on prior-year AGI.
    pub fn evaluate(
        &self,
        inputs: &SafeHarborInputs,
        current_year_tax: Decimal,
    ) -> SafeHarborEvaluation {
        let is_high_earner = self.is_high_earner(inputs.prior_year_agi);
        let prior_year_safe_harbor = self.prior_year_safe_harbor(inputs.prior_year_tax, is_high_earner);
        let current_year_safe_harbor = self.current_year_safe_harbor(current_year_tax);

        let (recommended_safe_harbor, recommended_method) =
            if prior_year_safe_harbor <= current_year_safe_harbor {
                (prior_year_safe_harbor, SafeHarborMethod::PriorYear)
            } else {
                (current_year_safe_harbor, SafeHarborMethod::CurrentYear)
            };

        debug!(
            is_high_earner,
            prior_year_safe_harbor = %prior_year_safe_harbor,
            current_year_safe_harbor = %current_year_safe_harbor,
            recommended = %recommended_method,
            "Evaluated safe harbor"
        );

        SafeHarborEvaluation {
            is_high_earner,
            prior_year_safe_harbor,
            current_year_safe_harbor,
            recommended_safe_harbor,
            recommended_method,
        }
    }

    /// Rough underpayment penalty if only the smaller threshold is paid.
    ///
    /// This is `max(0, liability - recommended) × penalty_rate`. It is an
    /// estimate for planning, not the IRS Form 2210 computation.
    pub fn penalty_estimate(
        &self,
        total_tax_liability: Decimal,
        evaluation: &SafeHarborEvaluation,
    ) -> Decimal {
        let shortfall = non_negative(total_tax_liability - evaluation.recommended_safe_harbor);
        shortfall * self.config.penalty_rate
    }

    fn is_high_earner(
        &self,
        prior_year_agi: Decimal,
    ) -> bool {
        prior_year_agi > self.config.high_earner_threshold
    }

    fn prior_year_safe_harbor(
        &self,
        prior_year_tax: Decimal,
        is_high_earner: bool,
    ) -> Decimal {
        if is_high_earner {
            prior_year_tax * self.config.high_earner_multiplier
        } else {
            prior_year_tax
        }
    }

    fn current_year_safe_harbor(
        &self,
        current_year_tax: Decimal,
    ) -> Decimal {
        current_year_tax * self.config.current_year_factor
    }
}
