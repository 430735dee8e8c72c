//! Letter module containing template selection and version lineage

pub mod selector;
pub mod version;

pub use selector::*;
pub use version::*;
