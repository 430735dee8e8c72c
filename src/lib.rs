//! # Fee-Letter Core
//!
//! Determination and reconciliation engine for accounting-firm billing
//! letters: decides which letter template(s) apply to a client, splits fee
//! totals into dated installment plans, and classifies payment deviations.
//!
//! ## Features
//!
//! - **Template selection**: explicit ordered decision table mapping client
//!   attributes to one or two letter templates with their check counts
//! - **Installment scheduling**: exact-sum splits with calendar-aware
//!   month arithmetic (month-end clamping, year rollover)
//! - **Deviation classification**: severity bands over the deviation
//!   percent, configurable thresholds, symmetric around zero
//! - **Reconciliation**: aggregate paid/pending/overdue state with an
//!   idempotent, conflict-retrying mark-paid write path
//! - **Letter lineage**: versioned letters with a one-latest-per-lineage
//!   invariant
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use fee_letter_core::{select, ClientType, FeeTemplate, LetterSelectionInput};
//!
//! let selection = select(&LetterSelectionInput {
//!     client_type: ClientType::External,
//!     is_retainer: false,
//!     apply_inflation: true,
//!     has_real_adjustment: false,
//!     bookkeeping_apply_inflation: None,
//!     bookkeeping_has_real_adjustment: None,
//! });
//! assert_eq!(selection.primary_template, FeeTemplate::ExternalIndexOnly);
//! ```

pub mod deviation;
pub mod letter;
pub mod reconcile;
pub mod schedule;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use deviation::*;
pub use letter::*;
pub use reconcile::*;
pub use schedule::*;
pub use traits::*;
pub use types::*;
