//! Reconciliation coordination
//!
//! Read-mostly aggregation over a client's fee calculation and recorded
//! payments, with two serialized write paths: installment status transitions
//! (compare-and-swap on the storage revision, bounded retry on conflict) and
//! letter-version revisions.

use chrono::NaiveDate;

use crate::deviation::{classify_with, DeviationThresholds};
use crate::letter::selector;
use crate::letter::version::{LetterVersionManager, MAX_CONFLICT_RETRIES};
use crate::schedule::build_schedule;
use crate::traits::*;
use crate::types::*;

/// Coordinates template selection, scheduling, and deviation classification
/// against persisted reconciliation state
pub struct Reconciler<S: ReconciliationStorage> {
    storage: S,
    letters: LetterVersionManager<S>,
    thresholds: DeviationThresholds,
    validator: Box<dyn FeeCalculationValidator>,
}

impl<S: ReconciliationStorage + Clone> Reconciler<S> {
    /// Create a reconciler with the default 2%/10% deviation policy
    pub fn new(storage: S) -> Self {
        Self::with_thresholds(storage, DeviationThresholds::default())
    }

    /// Create a reconciler with an explicit deviation policy
    pub fn with_thresholds(storage: S, thresholds: DeviationThresholds) -> Self {
        Self {
            storage: storage.clone(),
            letters: LetterVersionManager::new(storage),
            thresholds,
            validator: Box::new(DefaultFeeCalculationValidator),
        }
    }

    /// Replace the input validator
    pub fn with_validator(mut self, validator: Box<dyn FeeCalculationValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Produce the reconciliation report for a fee calculation
    ///
    /// Combines the selected template set, the installment plan when the
    /// chosen payment method splits the total, the deviation of recorded
    /// payments against the discount-adjusted expected amount, and the
    /// aggregate summary of persisted installments.
    pub async fn reconcile(
        &self,
        calculation: &FeeCalculation,
        payments: &[ActualPayment],
    ) -> EngineResult<ReconciliationReport> {
        self.validator.validate_fee_calculation(calculation)?;
        for payment in payments {
            self.validator.validate_payment(payment)?;
        }

        let selection = selector::select(&calculation.selection_input);
        let expected = calculation.expected_after_discount();

        let plan = if calculation.payment_method.requires_installments() {
            Some(build_schedule(
                u32::from(selection.primary_num_checks),
                expected,
                calculation.first_due_date,
                1,
            )?)
        } else {
            None
        };

        // Percent deviation is undefined against a zero expected amount, so
        // a fully discounted or zero-fee calculation is simply not classified.
        let deviation = if payments.is_empty() || expected == 0 {
            None
        } else {
            let actual: i64 = payments.iter().map(|p| p.total_paid).sum();
            Some(classify_with(expected, actual, &self.thresholds)?)
        };

        let summary = self.summary(&calculation.id).await?;

        Ok(ReconciliationReport {
            selection,
            plan,
            deviation,
            summary,
        })
    }

    /// Materialize the installment plan for a fee calculation into storage
    ///
    /// Only valid for payment methods that split into installments.
    pub async fn create_installments(
        &mut self,
        calculation: &FeeCalculation,
    ) -> EngineResult<Vec<PaymentInstallment>> {
        self.validator.validate_fee_calculation(calculation)?;

        if !calculation.payment_method.requires_installments() {
            return Err(EngineError::Validation(format!(
                "Payment method {:?} does not split into installments",
                calculation.payment_method
            )));
        }

        let selection = selector::select(&calculation.selection_input);
        let plan = build_schedule(
            u32::from(selection.primary_num_checks),
            calculation.expected_after_discount(),
            calculation.first_due_date,
            1,
        )?;

        let mut created = Vec::with_capacity(plan.len());
        for entry in &plan {
            let installment = PaymentInstallment::from_plan_entry(calculation.id.clone(), entry);
            self.storage.save_installment(&installment).await?;
            created.push(installment);
        }
        Ok(created)
    }

    /// Mark an installment paid
    ///
    /// Idempotent: a paid installment stays paid and the call succeeds
    /// without writing. Concurrent modifications are retried against a fresh
    /// read up to [`MAX_CONFLICT_RETRIES`] times before the conflict is
    /// surfaced; validation failures are never retried.
    pub async fn mark_installment_paid(
        &mut self,
        installment_id: &str,
    ) -> EngineResult<PaymentInstallment> {
        let mut last_conflict = None;

        for _ in 0..MAX_CONFLICT_RETRIES {
            let current = self
                .storage
                .get_installment(installment_id)
                .await?
                .ok_or_else(|| EngineError::InstallmentNotFound(installment_id.to_string()))?;

            if current.status == InstallmentStatus::Paid {
                return Ok(current);
            }
            if !current.status.can_transition_to(InstallmentStatus::Paid) {
                return Err(EngineError::InvalidTransition {
                    from: current.status,
                    to: InstallmentStatus::Paid,
                });
            }

            let mut updated = current.clone();
            updated.status = InstallmentStatus::Paid;
            updated.paid_at = Some(chrono::Utc::now().naive_utc());

            match self.storage.update_installment(&updated, current.revision).await {
                Ok(stored) => return Ok(stored),
                Err(EngineError::Conflict(reason)) => last_conflict = Some(reason),
                Err(other) => return Err(other),
            }
        }

        Err(EngineError::Conflict(last_conflict.unwrap_or_else(|| {
            format!("Could not mark installment '{}' paid", installment_id)
        })))
    }

    /// Move a single pending installment past its due date to overdue
    ///
    /// Already-overdue installments are left as they are; paid installments
    /// reject the transition.
    pub async fn mark_installment_overdue(
        &mut self,
        installment_id: &str,
        as_of: NaiveDate,
    ) -> EngineResult<PaymentInstallment> {
        let mut last_conflict = None;

        for _ in 0..MAX_CONFLICT_RETRIES {
            let current = self
                .storage
                .get_installment(installment_id)
                .await?
                .ok_or_else(|| EngineError::InstallmentNotFound(installment_id.to_string()))?;

            if current.status == InstallmentStatus::Overdue {
                return Ok(current);
            }
            if !current.status.can_transition_to(InstallmentStatus::Overdue) {
                return Err(EngineError::InvalidTransition {
                    from: current.status,
                    to: InstallmentStatus::Overdue,
                });
            }
            if current.due_date >= as_of {
                return Err(EngineError::Validation(format!(
                    "Installment '{}' is not past due as of {}",
                    installment_id, as_of
                )));
            }

            let mut updated = current.clone();
            updated.status = InstallmentStatus::Overdue;

            match self.storage.update_installment(&updated, current.revision).await {
                Ok(stored) => return Ok(stored),
                Err(EngineError::Conflict(reason)) => last_conflict = Some(reason),
                Err(other) => return Err(other),
            }
        }

        Err(EngineError::Conflict(last_conflict.unwrap_or_else(|| {
            format!("Could not mark installment '{}' overdue", installment_id)
        })))
    }

    /// Time-driven sweep: move every pending installment of a fee
    /// calculation whose due date has passed to overdue
    ///
    /// Returns the number of installments transitioned.
    pub async fn mark_overdue_installments(
        &mut self,
        fee_calculation_id: &str,
        as_of: NaiveDate,
    ) -> EngineResult<usize> {
        let installments = self.storage.list_installments(fee_calculation_id).await?;
        let mut transitioned = 0;

        for installment in installments {
            if installment.status == InstallmentStatus::Pending && installment.due_date < as_of {
                self.mark_installment_overdue(&installment.id, as_of).await?;
                transitioned += 1;
            }
        }
        Ok(transitioned)
    }

    /// Aggregate summary over a fee calculation's persisted installments
    pub async fn summary(&self, fee_calculation_id: &str) -> EngineResult<InstallmentSummary> {
        let installments = self.storage.list_installments(fee_calculation_id).await?;
        Ok(summarize(&installments))
    }

    /// Start a new letter lineage
    pub async fn open_letter_lineage(&mut self) -> EngineResult<LetterVersion> {
        self.letters.open_lineage().await
    }

    /// Revise a letter, appending the next version of its lineage
    pub async fn revise_letter(&mut self, root_letter_id: &str) -> EngineResult<LetterVersion> {
        self.letters.revise(root_letter_id).await
    }

    /// The latest version of a letter lineage
    pub async fn latest_letter(&self, root_letter_id: &str) -> EngineResult<LetterVersion> {
        self.letters.latest(root_letter_id).await
    }

    /// Full version history of a letter lineage
    pub async fn letter_history(&self, root_letter_id: &str) -> EngineResult<Vec<LetterVersion>> {
        self.letters.history(root_letter_id).await
    }
}

/// Fold a set of installments into the aggregate summary
pub fn summarize(installments: &[PaymentInstallment]) -> InstallmentSummary {
    let mut summary = InstallmentSummary {
        total_count: installments.len(),
        ..Default::default()
    };

    for installment in installments {
        summary.total_amount += installment.amount;
        match installment.status {
            InstallmentStatus::Paid => {
                summary.paid_count += 1;
                summary.paid_amount += installment.amount;
            }
            InstallmentStatus::Pending => summary.pending_count += 1,
            InstallmentStatus::Overdue => summary.overdue_count += 1,
        }
    }

    summary.remaining_amount = summary.total_amount - summary.paid_amount;
    summary
}
