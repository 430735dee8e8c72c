//! Input validation helpers

use crate::types::{EngineError, EngineResult};

/// Validate an installment count (must be positive)
pub fn validate_installment_count(count: u32) -> EngineResult<()> {
    if count == 0 {
        Err(EngineError::Validation(
            "Installment count must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate a total amount to be scheduled (must be non-negative)
pub fn validate_total_amount(total_amount: i64) -> EngineResult<()> {
    if total_amount < 0 {
        Err(EngineError::Validation(format!(
            "Total amount cannot be negative: {}",
            total_amount
        )))
    } else {
        Ok(())
    }
}

/// Validate an expected amount for percent-deviation math (must be non-zero)
pub fn validate_expected_amount(expected_amount: i64) -> EngineResult<()> {
    if expected_amount == 0 {
        Err(EngineError::Validation(
            "Deviation percent is undefined for a zero expected amount".to_string(),
        ))
    } else {
        Ok(())
    }
}
