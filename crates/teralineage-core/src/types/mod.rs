//! Data model types shared across the analyzer.

mod common;
mod report;

pub use common::{split_qualified_identifiers, unquote_identifier, QualifiedName};
pub use report::{
    Condition, FunctionEntry, FunctionKind, FunctionStackEntry, Meta, Op, Pseudocode, Report,
};
