//! Payment deviation classification
//!
//! Compares expected against actual payment amounts and assigns a severity
//! based on the deviation percent. Classification is symmetric around zero:
//! overpayment and underpayment of equal magnitude get equal severity.

use bigdecimal::BigDecimal;

use crate::types::{AlertLevel, EngineError, EngineResult, PaymentDeviation};
use crate::utils::validation::validate_expected_amount;

/// Severity thresholds on the absolute deviation percent
///
/// Deviations below `warning_percent` are informational; at or above
/// `critical_percent` they are critical; everything between is a warning.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeviationThresholds {
    pub warning_percent: BigDecimal,
    pub critical_percent: BigDecimal,
}

impl Default for DeviationThresholds {
    /// Default policy: 2% / 10%
    fn default() -> Self {
        Self {
            warning_percent: BigDecimal::from(2),
            critical_percent: BigDecimal::from(10),
        }
    }
}

impl DeviationThresholds {
    /// Validate that the thresholds form a sensible policy
    pub fn validate(&self) -> EngineResult<()> {
        if self.warning_percent <= BigDecimal::from(0) {
            return Err(EngineError::Validation(
                "Warning threshold must be positive".to_string(),
            ));
        }
        if self.critical_percent <= self.warning_percent {
            return Err(EngineError::Validation(format!(
                "Critical threshold ({}) must exceed warning threshold ({})",
                self.critical_percent, self.warning_percent
            )));
        }
        Ok(())
    }
}

/// Classify a payment deviation under the default 2%/10% policy
pub fn classify(expected_amount: i64, actual_amount: i64) -> EngineResult<PaymentDeviation> {
    classify_with(expected_amount, actual_amount, &DeviationThresholds::default())
}

/// Classify a payment deviation under an explicit threshold policy
///
/// Fails fast on a zero expected amount rather than producing an undefined
/// percentage; the caller is expected to skip classification in that case.
pub fn classify_with(
    expected_amount: i64,
    actual_amount: i64,
    thresholds: &DeviationThresholds,
) -> EngineResult<PaymentDeviation> {
    validate_expected_amount(expected_amount)?;
    thresholds.validate()?;

    let deviation_amount = actual_amount - expected_amount;
    let deviation_percent =
        BigDecimal::from(deviation_amount) * BigDecimal::from(100) / BigDecimal::from(expected_amount);

    let magnitude = deviation_percent.abs();
    let alert_level = if magnitude >= thresholds.critical_percent {
        AlertLevel::Critical
    } else if magnitude >= thresholds.warning_percent {
        AlertLevel::Warning
    } else {
        AlertLevel::Info
    };

    Ok(PaymentDeviation {
        expected_amount,
        actual_amount,
        deviation_amount,
        deviation_percent,
        alert_level,
        reviewed: false,
        reviewed_by: None,
        reviewed_at: None,
    })
}
