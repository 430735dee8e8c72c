//! Installment schedule generation
//!
//! Splits a total amount into `count` dated payments. Amounts use ceiling
//! division with the last installment absorbing the rounding remainder, so
//! the plan always sums to the requested total exactly. Dates use calendar
//! month arithmetic with month-end clamping (Jan 31 + 1 month is the last
//! day of February), stepped from the start date rather than cumulatively so
//! clamping never drifts later installments off their day of month.

use chrono::{Months, NaiveDate};

use crate::types::{EngineError, EngineResult, InstallmentPlanEntry};
use crate::utils::validation::{validate_installment_count, validate_total_amount};

/// Build a dated, amount-exact installment plan
///
/// `count` and `interval_months` must be positive; `total_amount` must be
/// non-negative. All installments carry `ceil(total / count)` except the
/// last, whose amount is the remainder after the others — never negative
/// and never larger than the rest.
pub fn build_schedule(
    count: u32,
    total_amount: i64,
    start_date: NaiveDate,
    interval_months: u32,
) -> EngineResult<Vec<InstallmentPlanEntry>> {
    validate_installment_count(count)?;
    validate_total_amount(total_amount)?;
    if interval_months == 0 {
        return Err(EngineError::Validation(
            "Installment interval must be at least one month".to_string(),
        ));
    }

    let count_i64 = i64::from(count);
    let per_installment = (total_amount + count_i64 - 1) / count_i64;

    let mut plan = Vec::with_capacity(count as usize);
    let mut remaining = total_amount;
    for index in 0..count {
        let months_ahead = index.checked_mul(interval_months).ok_or_else(|| {
            EngineError::Validation(format!(
                "Installment date arithmetic overflows at index {}",
                index
            ))
        })?;
        let due_date = start_date
            .checked_add_months(Months::new(months_ahead))
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "Installment date out of range: {} + {} months",
                    start_date, months_ahead
                ))
            })?;

        // The last installment absorbs whatever the ceil split left over.
        // Capping at the remainder keeps amounts non-negative even when the
        // total is smaller than the installment count.
        let amount = if index + 1 == count {
            remaining
        } else {
            per_installment.min(remaining)
        };
        remaining -= amount;

        plan.push(InstallmentPlanEntry {
            installment_number: index + 1,
            due_date,
            amount,
        });
    }

    Ok(plan)
}
