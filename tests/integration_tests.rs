//! Integration tests for fee-letter-core

use chrono::NaiveDate;
use fee_letter_core::{
    build_schedule, classify, select, utils::MemoryStorage, ActualPayment, AlertLevel, ClientType,
    FeeCalculation, FeeTemplate, InstallmentStatus, LetterSelectionInput, PaymentMethod,
    Reconciler,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn internal_input() -> LetterSelectionInput {
    LetterSelectionInput {
        client_type: ClientType::Internal,
        is_retainer: false,
        apply_inflation: true,
        has_real_adjustment: false,
        bookkeeping_apply_inflation: Some(false),
        bookkeeping_has_real_adjustment: Some(false),
    }
}

#[tokio::test]
async fn test_complete_reconciliation_workflow() {
    let storage = MemoryStorage::new();
    let mut reconciler = Reconciler::new(storage);

    let calculation = FeeCalculation {
        id: "client-42-2024".to_string(),
        selection_input: internal_input(),
        expected_amount: 12000,
        payment_method: PaymentMethod::CardInstallments,
        first_due_date: date(2024, 1, 10),
    };

    // Card installments carry a 4% discount: 12000 -> 11520
    assert_eq!(calculation.expected_after_discount(), 11520);

    // Materialize the plan: internal audit letter is split into 8 checks
    let installments = reconciler.create_installments(&calculation).await.unwrap();
    assert_eq!(installments.len(), 8);
    assert_eq!(installments.iter().map(|i| i.amount).sum::<i64>(), 11520);

    // Settle the first two installments
    reconciler
        .mark_installment_paid(&installments[0].id)
        .await
        .unwrap();
    reconciler
        .mark_installment_paid(&installments[1].id)
        .await
        .unwrap();

    // The client paid the discounted total exactly
    let payments = vec![ActualPayment {
        total_paid: 11520,
        method: PaymentMethod::CardInstallments,
        net_amount: 9600,
        vat_amount: 1920,
    }];

    let report = reconciler.reconcile(&calculation, &payments).await.unwrap();

    // Internal client: two letters, audit primary with 8 checks,
    // bookkeeping secondary always with 12
    assert_eq!(
        report.selection.primary_template,
        FeeTemplate::InternalAuditIndex
    );
    assert_eq!(report.selection.primary_num_checks, 8);
    assert_eq!(
        report.selection.secondary_template,
        Some(FeeTemplate::InternalBookkeepingAgreed)
    );
    assert_eq!(report.selection.secondary_num_checks, Some(12));

    let plan = report.plan.as_ref().unwrap();
    assert_eq!(plan.len(), 8);
    assert_eq!(plan.iter().map(|e| e.amount).sum::<i64>(), 11520);

    let deviation = report.deviation.as_ref().unwrap();
    assert_eq!(deviation.deviation_amount, 0);
    assert_eq!(deviation.alert_level, AlertLevel::Info);

    assert_eq!(report.summary.total_count, 8);
    assert_eq!(report.summary.paid_count, 2);
    assert_eq!(report.summary.pending_count, 6);
    assert_eq!(report.summary.total_amount, 11520);
    assert_eq!(report.summary.paid_amount, 2880);
    assert_eq!(report.summary.remaining_amount, 8640);
}

#[tokio::test]
async fn test_underpayment_with_overdue_installments() {
    let mut reconciler = Reconciler::new(MemoryStorage::new());

    let calculation = FeeCalculation {
        id: "client-7-2024".to_string(),
        selection_input: LetterSelectionInput {
            client_type: ClientType::External,
            is_retainer: false,
            apply_inflation: false,
            has_real_adjustment: false,
            bookkeeping_apply_inflation: None,
            bookkeeping_has_real_adjustment: None,
        },
        expected_amount: 10000,
        payment_method: PaymentMethod::Checks,
        first_due_date: date(2024, 1, 5),
    };

    let installments = reconciler.create_installments(&calculation).await.unwrap();
    assert_eq!(installments.len(), 8);

    // Two due dates have passed with no payment recorded
    let transitioned = reconciler
        .mark_overdue_installments(&calculation.id, date(2024, 3, 1))
        .await
        .unwrap();
    assert_eq!(transitioned, 2);

    // Client paid 8000 of the expected 10000 (checks: no discount): -20%
    let payments = vec![ActualPayment {
        total_paid: 8000,
        method: PaymentMethod::Checks,
        net_amount: 6780,
        vat_amount: 1220,
    }];

    let report = reconciler.reconcile(&calculation, &payments).await.unwrap();
    assert_eq!(
        report.selection.primary_template,
        FeeTemplate::ExternalAsAgreed
    );

    let deviation = report.deviation.as_ref().unwrap();
    assert_eq!(deviation.deviation_amount, -2000);
    assert_eq!(deviation.alert_level, AlertLevel::Critical);

    assert_eq!(report.summary.overdue_count, 2);
    assert_eq!(report.summary.pending_count, 6);

    // An overdue installment can still be settled and drops out of the count
    let overdue_id = {
        let listed = reconciler.summary(&calculation.id).await.unwrap();
        assert_eq!(listed.overdue_count, 2);
        installments[0].id.clone()
    };
    let settled = reconciler.mark_installment_paid(&overdue_id).await.unwrap();
    assert_eq!(settled.status, InstallmentStatus::Paid);

    let summary = reconciler.summary(&calculation.id).await.unwrap();
    assert_eq!(summary.overdue_count, 1);
    assert_eq!(summary.paid_count, 1);
}

#[tokio::test]
async fn test_letter_lineage_through_reconciler() {
    let mut reconciler: Reconciler<MemoryStorage> = Reconciler::new(MemoryStorage::new());

    let root = reconciler.open_letter_lineage().await.unwrap();
    let v2 = reconciler.revise_letter(&root.root_letter_id).await.unwrap();
    let v3 = reconciler.revise_letter(&root.root_letter_id).await.unwrap();

    assert_eq!(v2.version_number, 2);
    assert_eq!(v3.version_number, 3);

    let history = reconciler
        .letter_history(&root.root_letter_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.iter().filter(|v| v.is_latest).count(), 1);
    assert_eq!(
        reconciler
            .latest_letter(&root.root_letter_id)
            .await
            .unwrap()
            .id,
        v3.id
    );
}

#[test]
fn test_selection_scenarios() {
    // External indexed client: single letter, 8 checks
    let selection = select(&LetterSelectionInput {
        client_type: ClientType::External,
        is_retainer: false,
        apply_inflation: true,
        has_real_adjustment: false,
        bookkeeping_apply_inflation: None,
        bookkeeping_has_real_adjustment: None,
    });
    assert_eq!(selection.primary_template, FeeTemplate::ExternalIndexOnly);
    assert_eq!(selection.primary_num_checks, 8);
    assert_eq!(selection.secondary_template, None);

    // Internal indexed client with as-agreed bookkeeping: two letters
    let selection = select(&internal_input());
    assert_eq!(selection.primary_template, FeeTemplate::InternalAuditIndex);
    assert_eq!(selection.primary_num_checks, 8);
    assert_eq!(
        selection.secondary_template,
        Some(FeeTemplate::InternalBookkeepingAgreed)
    );
    assert_eq!(selection.secondary_num_checks, Some(12));

    // Retainer with a real adjustment: retainer flag overrides client type
    let selection = select(&LetterSelectionInput {
        client_type: ClientType::Internal,
        is_retainer: true,
        apply_inflation: false,
        has_real_adjustment: true,
        bookkeeping_apply_inflation: Some(true),
        bookkeeping_has_real_adjustment: Some(true),
    });
    assert_eq!(selection.primary_template, FeeTemplate::RetainerReal);
    assert_eq!(selection.primary_num_checks, 12);
    assert_eq!(selection.secondary_template, None);
}

#[test]
fn test_schedule_and_deviation_scenarios() {
    let plan = build_schedule(3, 1000, date(2024, 1, 31), 1).unwrap();
    let amounts: Vec<i64> = plan.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![334, 334, 332]);
    let dates: Vec<NaiveDate> = plan.iter().map(|e| e.due_date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]
    );

    let warning = classify(1000, 1050).unwrap();
    assert_eq!(warning.deviation_percent, bigdecimal::BigDecimal::from(5));
    assert_eq!(warning.alert_level, AlertLevel::Warning);

    let critical = classify(1000, 1200).unwrap();
    assert_eq!(critical.deviation_percent, bigdecimal::BigDecimal::from(20));
    assert_eq!(critical.alert_level, AlertLevel::Critical);
}

#[test]
fn test_fixed_enumeration_wire_forms() {
    // These strings are a wire contract with downstream report generation
    let templates = [
        (FeeTemplate::ExternalIndexOnly, "external_index_only"),
        (FeeTemplate::ExternalRealChange, "external_real_change"),
        (FeeTemplate::ExternalAsAgreed, "external_as_agreed"),
        (FeeTemplate::InternalAuditIndex, "internal_audit_index"),
        (FeeTemplate::InternalAuditReal, "internal_audit_real"),
        (FeeTemplate::InternalAuditAgreed, "internal_audit_agreed"),
        (
            FeeTemplate::InternalBookkeepingIndex,
            "internal_bookkeeping_index",
        ),
        (
            FeeTemplate::InternalBookkeepingReal,
            "internal_bookkeeping_real",
        ),
        (
            FeeTemplate::InternalBookkeepingAgreed,
            "internal_bookkeeping_agreed",
        ),
        (FeeTemplate::RetainerIndex, "retainer_index"),
        (FeeTemplate::RetainerReal, "retainer_real"),
    ];
    for (template, expected) in templates {
        assert_eq!(
            serde_json::to_value(template).unwrap(),
            serde_json::Value::String(expected.to_string())
        );
    }

    for (status, expected) in [
        (InstallmentStatus::Pending, "pending"),
        (InstallmentStatus::Paid, "paid"),
        (InstallmentStatus::Overdue, "overdue"),
    ] {
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            serde_json::Value::String(expected.to_string())
        );
    }

    for (level, expected) in [
        (AlertLevel::Info, "info"),
        (AlertLevel::Warning, "warning"),
        (AlertLevel::Critical, "critical"),
    ] {
        assert_eq!(
            serde_json::to_value(level).unwrap(),
            serde_json::Value::String(expected.to_string())
        );
    }
}

#[test]
fn test_payment_method_discounts() {
    assert_eq!(PaymentMethod::BankTransfer.discount_percent(), 9);
    assert_eq!(PaymentMethod::CardSinglePayment.discount_percent(), 8);
    assert_eq!(PaymentMethod::CardInstallments.discount_percent(), 4);
    assert_eq!(PaymentMethod::Checks.discount_percent(), 0);

    assert!(!PaymentMethod::BankTransfer.requires_installments());
    assert!(!PaymentMethod::CardSinglePayment.requires_installments());
    assert!(PaymentMethod::CardInstallments.requires_installments());
    assert!(PaymentMethod::Checks.requires_installments());

    assert_eq!(PaymentMethod::BankTransfer.apply_discount(10000), 9100);
    assert_eq!(PaymentMethod::Checks.apply_discount(10000), 10000);
}

#[tokio::test]
async fn test_invalid_payment_is_rejected() {
    let reconciler = Reconciler::new(MemoryStorage::new());
    let calculation = FeeCalculation {
        id: "client-9".to_string(),
        selection_input: internal_input(),
        expected_amount: 5000,
        payment_method: PaymentMethod::BankTransfer,
        first_due_date: date(2024, 1, 1),
    };

    // VAT split that does not add up must fail fast
    let payments = vec![ActualPayment {
        total_paid: 5000,
        method: PaymentMethod::BankTransfer,
        net_amount: 4000,
        vat_amount: 900,
    }];
    assert!(reconciler.reconcile(&calculation, &payments).await.is_err());
}
