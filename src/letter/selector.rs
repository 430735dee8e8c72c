//! Billing-letter template selection
//!
//! The decision logic is an ordered rule table: the first rule whose
//! condition holds produces the selection. Order is a business rule, not an
//! implementation detail — retainer beats client type, and within every
//! branch a negotiated ("real") adjustment beats inflation indexing beats
//! the as-agreed flat fee.

use crate::types::{ClientType, FeeTemplate, LetterSelection, LetterSelectionInput};

/// Audit and external letters are invoiced in 8 checks
pub const AUDIT_NUM_CHECKS: u8 = 8;
/// Bookkeeping invoices are always split into 12 checks, independent of the
/// primary letter's split
pub const BOOKKEEPING_NUM_CHECKS: u8 = 12;
/// Retainer fees are always split into 12 checks
pub const RETAINER_NUM_CHECKS: u8 = 12;

/// One row of the selection decision table
pub struct SelectionRule {
    /// Human-readable rule name, used in diagnostics and tests
    pub name: &'static str,
    applies: fn(&LetterSelectionInput) -> bool,
    build: fn(&LetterSelectionInput) -> LetterSelection,
}

impl SelectionRule {
    /// Whether this rule's condition holds for the given input
    pub fn applies(&self, input: &LetterSelectionInput) -> bool {
        (self.applies)(input)
    }

    /// Produce this rule's selection for the given input
    pub fn build(&self, input: &LetterSelectionInput) -> LetterSelection {
        (self.build)(input)
    }
}

/// The decision table, evaluated top to bottom; the last rule is a catch-all
pub const SELECTION_RULES: &[SelectionRule] = &[
    SelectionRule {
        name: "retainer",
        applies: |input| input.is_retainer,
        build: build_retainer_selection,
    },
    SelectionRule {
        name: "internal",
        applies: |input| input.client_type == ClientType::Internal,
        build: build_internal_selection,
    },
    SelectionRule {
        name: "external",
        applies: |_| true,
        build: build_external_selection,
    },
];

/// Select the letter template(s) for a client
///
/// Total function: every valid input has a defined output. Out-of-enum
/// values cannot be expressed by the caller in the first place.
pub fn select(input: &LetterSelectionInput) -> LetterSelection {
    for rule in SELECTION_RULES {
        if rule.applies(input) {
            return rule.build(input);
        }
    }
    // The table ends with a catch-all rule, so this is only reached if the
    // table itself is edited incorrectly.
    build_external_selection(input)
}

/// Shared 3-way priority: real adjustment beats inflation indexing beats
/// the as-agreed flat fee
fn three_way_priority(
    has_real_adjustment: bool,
    apply_inflation: bool,
    real: FeeTemplate,
    index: FeeTemplate,
    agreed: FeeTemplate,
) -> FeeTemplate {
    if has_real_adjustment {
        real
    } else if apply_inflation {
        index
    } else {
        agreed
    }
}

fn build_retainer_selection(input: &LetterSelectionInput) -> LetterSelection {
    let template = if input.has_real_adjustment {
        FeeTemplate::RetainerReal
    } else {
        FeeTemplate::RetainerIndex
    };
    LetterSelection {
        primary_template: template,
        primary_num_checks: RETAINER_NUM_CHECKS,
        secondary_template: None,
        secondary_num_checks: None,
    }
}

fn build_internal_selection(input: &LetterSelectionInput) -> LetterSelection {
    let primary = three_way_priority(
        input.has_real_adjustment,
        input.apply_inflation,
        FeeTemplate::InternalAuditReal,
        FeeTemplate::InternalAuditIndex,
        FeeTemplate::InternalAuditAgreed,
    );
    let secondary = three_way_priority(
        input.bookkeeping_has_real_adjustment.unwrap_or(false),
        input.bookkeeping_apply_inflation.unwrap_or(false),
        FeeTemplate::InternalBookkeepingReal,
        FeeTemplate::InternalBookkeepingIndex,
        FeeTemplate::InternalBookkeepingAgreed,
    );
    LetterSelection {
        primary_template: primary,
        primary_num_checks: AUDIT_NUM_CHECKS,
        secondary_template: Some(secondary),
        secondary_num_checks: Some(BOOKKEEPING_NUM_CHECKS),
    }
}

fn build_external_selection(input: &LetterSelectionInput) -> LetterSelection {
    let template = three_way_priority(
        input.has_real_adjustment,
        input.apply_inflation,
        FeeTemplate::ExternalRealChange,
        FeeTemplate::ExternalIndexOnly,
        FeeTemplate::ExternalAsAgreed,
    );
    LetterSelection {
        primary_template: template,
        primary_num_checks: AUDIT_NUM_CHECKS,
        secondary_template: None,
        secondary_num_checks: None,
    }
}
