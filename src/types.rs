//! Core types and data structures for the fee-letter engine

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Client classification for letter determination
///
/// Internal clients receive bookkeeping services from the firm and therefore
/// get a second (bookkeeping) letter; external clients get a single letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Internal,
    External,
}

/// Billing-letter template identifiers
///
/// These serialize to the exact snake_case strings consumed by the
/// report-generation layer downstream; renaming a variant is a wire break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeTemplate {
    ExternalIndexOnly,
    ExternalRealChange,
    ExternalAsAgreed,
    InternalAuditIndex,
    InternalAuditReal,
    InternalAuditAgreed,
    InternalBookkeepingIndex,
    InternalBookkeepingReal,
    InternalBookkeepingAgreed,
    RetainerIndex,
    RetainerReal,
}

/// Client attributes driving template selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterSelectionInput {
    /// Internal or external client
    pub client_type: ClientType,
    /// Retainer clients take precedence over client type entirely
    pub is_retainer: bool,
    /// Fee tied to a published price index
    pub apply_inflation: bool,
    /// Negotiated ("real") fee change; beats inflation indexing
    pub has_real_adjustment: bool,
    /// Bookkeeping-letter counterpart of `apply_inflation`
    /// (only meaningful for internal clients)
    pub bookkeeping_apply_inflation: Option<bool>,
    /// Bookkeeping-letter counterpart of `has_real_adjustment`
    pub bookkeeping_has_real_adjustment: Option<bool>,
}

/// Outcome of template selection
///
/// Secondary fields are present if and only if the client is internal and
/// not a retainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterSelection {
    pub primary_template: FeeTemplate,
    pub primary_num_checks: u8,
    pub secondary_template: Option<FeeTemplate>,
    pub secondary_num_checks: Option<u8>,
}

/// Payment methods and their fixed discount percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    CardSinglePayment,
    CardInstallments,
    Checks,
}

impl PaymentMethod {
    /// Fixed discount percentage granted for this payment method
    pub fn discount_percent(&self) -> u32 {
        match self {
            PaymentMethod::BankTransfer => 9,
            PaymentMethod::CardSinglePayment => 8,
            PaymentMethod::CardInstallments => 4,
            PaymentMethod::Checks => 0,
        }
    }

    /// Whether paying with this method splits the total into installments
    pub fn requires_installments(&self) -> bool {
        matches!(
            self,
            PaymentMethod::CardInstallments | PaymentMethod::Checks
        )
    }

    /// Apply this method's discount to an amount in integer currency units
    pub fn apply_discount(&self, amount: i64) -> i64 {
        amount - amount * i64::from(self.discount_percent()) / 100
    }
}

/// One entry of a generated installment plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlanEntry {
    /// 1-based, contiguous
    pub installment_number: u32,
    pub due_date: NaiveDate,
    /// Integer currency units; the last entry absorbs the rounding remainder
    pub amount: i64,
}

/// Lifecycle of a persisted installment
///
/// Allowed transitions: pending -> paid, pending -> overdue (time-driven),
/// overdue -> paid. Paid is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
}

impl InstallmentStatus {
    /// Whether the status machine permits moving from `self` to `target`
    pub fn can_transition_to(&self, target: InstallmentStatus) -> bool {
        matches!(
            (self, target),
            (InstallmentStatus::Pending, InstallmentStatus::Paid)
                | (InstallmentStatus::Pending, InstallmentStatus::Overdue)
                | (InstallmentStatus::Overdue, InstallmentStatus::Paid)
        )
    }
}

/// Persisted unit of an installment plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstallment {
    pub id: String,
    /// Fee calculation this installment belongs to
    pub fee_calculation_id: String,
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub amount: i64,
    pub status: InstallmentStatus,
    pub paid_at: Option<NaiveDateTime>,
    /// Storage revision used for optimistic-concurrency checks
    pub revision: u64,
}

impl PaymentInstallment {
    /// Create a pending installment from a plan entry
    pub fn from_plan_entry(fee_calculation_id: String, entry: &InstallmentPlanEntry) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            fee_calculation_id,
            installment_number: entry.installment_number,
            due_date: entry.due_date,
            amount: entry.amount,
            status: InstallmentStatus::Pending,
            paid_at: None,
            revision: 0,
        }
    }
}

/// A recorded payment against a fee calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualPayment {
    /// Total paid, VAT included
    pub total_paid: i64,
    pub method: PaymentMethod,
    /// Amount before VAT
    pub net_amount: i64,
    pub vat_amount: i64,
}

/// Severity assigned to a payment deviation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

/// Gap between expected and actual payment, tagged with a severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDeviation {
    pub expected_amount: i64,
    pub actual_amount: i64,
    /// Signed; positive means overpayment
    pub deviation_amount: i64,
    /// Signed percentage of the expected amount
    pub deviation_percent: BigDecimal,
    pub alert_level: AlertLevel,
    pub reviewed: bool,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<NaiveDateTime>,
}

impl PaymentDeviation {
    /// One-way review flag; a repeat call keeps the first reviewer
    pub fn mark_reviewed(&mut self, reviewer: &str) {
        if self.reviewed {
            return;
        }
        self.reviewed = true;
        self.reviewed_by = Some(reviewer.to_string());
        self.reviewed_at = Some(chrono::Utc::now().naive_utc());
    }
}

/// One version in a letter lineage
///
/// Exactly one version per lineage carries `is_latest == true` at any time;
/// revising a letter creates the next version and flips the previous flag
/// in the same atomic storage operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterVersion {
    pub id: String,
    /// Back-reference to the first version of the lineage
    pub root_letter_id: String,
    pub version_number: u32,
    pub is_latest: bool,
    pub created_at: NaiveDateTime,
}

/// A client's fee calculation, the input side of reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCalculation {
    pub id: String,
    pub selection_input: LetterSelectionInput,
    /// Expected total before any payment-method discount
    pub expected_amount: i64,
    pub payment_method: PaymentMethod,
    pub first_due_date: NaiveDate,
}

impl FeeCalculation {
    /// Expected amount net of the chosen method's discount
    pub fn expected_after_discount(&self) -> i64 {
        self.payment_method.apply_discount(self.expected_amount)
    }
}

/// Aggregate counts and amounts over a fee calculation's installments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentSummary {
    pub total_count: usize,
    pub paid_count: usize,
    pub pending_count: usize,
    pub overdue_count: usize,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub remaining_amount: i64,
}

/// Output of a reconciliation pass, consumed by reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub selection: LetterSelection,
    /// Present when the chosen payment method splits into installments
    pub plan: Option<Vec<InstallmentPlanEntry>>,
    /// Present when at least one payment was recorded
    pub deviation: Option<PaymentDeviation>,
    pub summary: InstallmentSummary,
}

/// Errors that can occur in the engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Installment not found: {0}")]
    InstallmentNotFound(String),
    #[error("Letter not found: {0}")]
    LetterNotFound(String),
    #[error("Invalid installment transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: InstallmentStatus,
        to: InstallmentStatus,
    },
    #[error("Concurrent modification: {0}")]
    Conflict(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
