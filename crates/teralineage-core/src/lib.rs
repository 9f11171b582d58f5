//! Teradata-dialect SQL lineage extraction: given an already-parsed AST, produce a
//! structured report of the base tables, columns, constant-value predicates, CTEs,
//! temp tables, created objects, write targets, callables, and per-SELECT pseudocode
//! the script touches.
//!
//! The SQL-to-AST step lives in [`parser`] purely as a convenience for this crate's own
//! tests and for callers that don't already have a Teradata-tagged parser on hand — the
//! engine itself, [`analyzer::analyze`], is AST-in, AST-out.

pub mod analyzer;
pub mod error;
pub mod parser;
pub mod types;

pub use analyzer::analyze;
pub use error::{AnalysisError, Dialect, Error, ErrorEnvelope, ParseError, ParseErrorKind, Position};
pub use parser::parse_sql;
pub use types::{
    Condition, FunctionEntry, FunctionKind, FunctionStackEntry, Meta, Op, Pseudocode,
    QualifiedName, Report,
};
