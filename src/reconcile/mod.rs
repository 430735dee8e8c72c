//! Reconciliation module orchestrating selection, scheduling, and deviation

pub mod coordinator;

pub use coordinator::*;
