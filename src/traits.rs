//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for reconciliation state
///
/// The engine itself performs no I/O; this trait lets the coordinator's two
/// write paths (installment transitions and letter-version lineage) run
/// against any backend (PostgreSQL, SQLite, in-memory, etc.). Implementors
/// must make `update_installment` and `supersede_latest` atomic per entity:
/// the first is a compare-and-swap on the installment's revision, the second
/// must insert the new version and clear the previous latest flag in one
/// indivisible step.
#[async_trait]
pub trait ReconciliationStorage: Send + Sync {
    /// Save a new installment
    async fn save_installment(&mut self, installment: &PaymentInstallment) -> EngineResult<()>;

    /// Get an installment by ID
    async fn get_installment(&self, installment_id: &str)
        -> EngineResult<Option<PaymentInstallment>>;

    /// List all installments recorded against a fee calculation,
    /// ordered by installment number
    async fn list_installments(
        &self,
        fee_calculation_id: &str,
    ) -> EngineResult<Vec<PaymentInstallment>>;

    /// Conditionally update an installment
    ///
    /// Fails with [`EngineError::Conflict`] when the stored revision no
    /// longer matches `expected_revision`; on success returns the stored
    /// installment with its revision advanced.
    async fn update_installment(
        &mut self,
        installment: &PaymentInstallment,
        expected_revision: u64,
    ) -> EngineResult<PaymentInstallment>;

    /// Save the first version of a new letter lineage
    async fn save_letter_version(&mut self, version: &LetterVersion) -> EngineResult<()>;

    /// Get a letter version by ID
    async fn get_letter_version(&self, version_id: &str) -> EngineResult<Option<LetterVersion>>;

    /// Get the single version of a lineage currently flagged latest
    async fn get_latest_version(
        &self,
        root_letter_id: &str,
    ) -> EngineResult<Option<LetterVersion>>;

    /// List all versions of a lineage, ordered by version number
    async fn list_versions(&self, root_letter_id: &str) -> EngineResult<Vec<LetterVersion>>;

    /// Atomically insert `next` and clear the latest flag on the version it
    /// supersedes, keeping exactly one latest per lineage
    async fn supersede_latest(
        &mut self,
        root_letter_id: &str,
        next: &LetterVersion,
    ) -> EngineResult<LetterVersion>;
}

/// Trait for implementing custom fee-calculation validation rules
pub trait FeeCalculationValidator: Send + Sync {
    /// Validate a fee calculation before reconciling against it
    fn validate_fee_calculation(&self, calculation: &FeeCalculation) -> EngineResult<()>;

    /// Validate a recorded payment
    fn validate_payment(&self, payment: &ActualPayment) -> EngineResult<()>;
}

/// Default validator with the basic input rules
pub struct DefaultFeeCalculationValidator;

impl FeeCalculationValidator for DefaultFeeCalculationValidator {
    fn validate_fee_calculation(&self, calculation: &FeeCalculation) -> EngineResult<()> {
        if calculation.id.trim().is_empty() {
            return Err(EngineError::Validation(
                "Fee calculation ID cannot be empty".to_string(),
            ));
        }
        if calculation.expected_amount < 0 {
            return Err(EngineError::Validation(format!(
                "Expected amount cannot be negative: {}",
                calculation.expected_amount
            )));
        }
        Ok(())
    }

    fn validate_payment(&self, payment: &ActualPayment) -> EngineResult<()> {
        if payment.total_paid < 0 {
            return Err(EngineError::Validation(format!(
                "Payment total cannot be negative: {}",
                payment.total_paid
            )));
        }
        if payment.net_amount + payment.vat_amount != payment.total_paid {
            return Err(EngineError::Validation(format!(
                "VAT split does not add up: {} + {} != {}",
                payment.net_amount, payment.vat_amount, payment.total_paid
            )));
        }
        Ok(())
    }
}
