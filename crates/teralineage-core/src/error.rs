//! Error types for SQL parsing and lineage analysis.
//!
//! # Error Handling Strategy
//!
//! This crate uses two complementary error handling patterns:
//!
//! - [`ParseError`]: fatal errors raised while turning SQL text into an AST. Returned as
//!   `Result<T, ParseError>` and stop processing of the affected input entirely.
//! - [`AnalysisError`]: fatal errors raised while walking an already-parsed AST (an
//!   unexpected or malformed tree shape). Also aborts with no partial [`crate::Report`].
//! - [`crate::types::Issue`] (non-fatal): ambiguous or unresolvable references, star
//!   usage, and similar conditions. These never abort a run; they accumulate into the
//!   Report's `_warnings` array alongside a successful result.
//!
//! [`Error`] unifies the two fatal cases for callers that want a single `Result` type,
//! and [`ErrorEnvelope`] is the serializable shape used by the soft error mode described
//! in the external interface (the caller receives `{error, type}` instead of a Report).

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
#[cfg(feature = "tracing")]
use tracing::trace;

/// Dialect tag carried on parse errors for diagnostic display.
///
/// This crate's AST input is always Teradata-tagged (see crate-level docs); the variant
/// exists so error messages read naturally and so a future dialect does not require
/// reshaping this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Teradata,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Teradata => write!(f, "Teradata"),
        }
    }
}

/// Error encountered while parsing SQL text into an AST.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Line/column where the error occurred, if the underlying parser reported one.
    pub position: Option<Position>,
    /// The dialect in effect when the error occurred.
    pub dialect: Option<Dialect>,
    /// The specific category of parse error.
    pub kind: ParseErrorKind,
}

/// Line/column position of a parse error (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Category of parse error for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorKind {
    #[default]
    SyntaxError,
    MissingClause,
    UnexpectedEof,
    UnsupportedFeature,
    LexerError,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            dialect: None,
            kind: ParseErrorKind::SyntaxError,
        }
    }

    pub fn with_position(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(Position { line, column }),
            dialect: None,
            kind: ParseErrorKind::SyntaxError,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Parses position from sqlparser's error message format.
    ///
    /// sqlparser formats positions as "... at Line: X, Column: Y". This parsing is
    /// coupled to that format and gracefully returns `None` if it doesn't match.
    fn parse_position_from_message(message: &str) -> Option<Position> {
        static POSITION_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = POSITION_REGEX
            .get_or_init(|| Regex::new(r"Line:\s*(\d+)\s*,\s*Column:\s*(\d+)").unwrap());

        let result = re.captures(message).and_then(|caps| {
            let line: usize = caps.get(1)?.as_str().parse().ok()?;
            let column: usize = caps.get(2)?.as_str().parse().ok()?;
            Some(Position { line, column })
        });

        #[cfg(feature = "tracing")]
        if result.is_none() && (message.contains("Line") || message.contains("Column")) {
            trace!(message, "failed to parse position from parser message");
        }

        result
    }

    fn infer_kind_from_message(message: &str) -> ParseErrorKind {
        let lower = message.to_lowercase();
        if lower.contains("unexpected end") || lower.contains("eof") {
            ParseErrorKind::UnexpectedEof
        } else if lower.contains("expected") {
            ParseErrorKind::MissingClause
        } else if lower.contains("not supported") || lower.contains("unsupported") {
            ParseErrorKind::UnsupportedFeature
        } else if lower.contains("lexer") || lower.contains("token") {
            ParseErrorKind::LexerError
        } else {
            ParseErrorKind::SyntaxError
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error")?;
        if let Some(dialect) = self.dialect {
            write!(f, " ({dialect})")?;
        }
        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        let message = err.to_string();
        let position = Self::parse_position_from_message(&message);
        let kind = Self::infer_kind_from_message(&message);
        Self {
            message,
            position,
            dialect: Some(Dialect::Teradata),
            kind,
        }
    }
}

/// Error encountered while walking an already-parsed AST.
///
/// Reserved for shapes the traversal genuinely cannot make sense of (for example, a
/// statement whose node graph is so malformed it has no safe fallback). Per the error
/// handling design, attribution failures and unresolved references are *not* raised
/// this way — they become [`crate::types::Issue`] warnings so that analysis can
/// continue with partial results.
#[derive(Debug, Clone, thiserror::Error)]
#[error("analysis error: {message}")]
pub struct AnalysisError {
    pub message: String,
}

impl AnalysisError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Unified fatal error for the two strict-mode failure classes in the error taxonomy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl Error {
    /// The `type` discriminant used by the soft error envelope.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Error::Parse(_) => "parse",
            Error::Analysis(_) => "runtime",
        }
    }
}

/// Soft-mode error envelope: `{error: "<message>", type: "parse" | "runtime"}`.
///
/// Returned in place of a Report when the caller selected soft error handling; the
/// enclosing command-line surface exits with status 0 when this is what gets printed.
#[derive(Debug, Clone, serde::Serialize, schemars::JsonSchema)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&Error> for ErrorEnvelope {
    fn from(err: &Error) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_position_from_message() {
        let msg = "Expected SELECT, found 'INSERT' at Line: 1, Column: 5";
        let pos = ParseError::parse_position_from_message(msg);
        assert_eq!(pos, Some(Position { line: 1, column: 5 }));
    }

    #[test]
    fn parse_position_missing() {
        assert_eq!(ParseError::parse_position_from_message("Unexpected token"), None);
    }

    #[test]
    fn infer_kind_variants() {
        assert_eq!(
            ParseError::infer_kind_from_message("Unexpected end of input"),
            ParseErrorKind::UnexpectedEof
        );
        assert_eq!(
            ParseError::infer_kind_from_message("Expected SELECT keyword"),
            ParseErrorKind::MissingClause
        );
        assert_eq!(
            ParseError::infer_kind_from_message("Something went wrong"),
            ParseErrorKind::SyntaxError
        );
    }

    #[test]
    fn display_includes_dialect_and_position() {
        let err = ParseError::with_position("Bad syntax", 1, 5).with_dialect(Dialect::Teradata);
        assert_eq!(err.to_string(), "parse error (Teradata) at line 1, column 5: Bad syntax");
    }

    #[test]
    fn envelope_reports_parse_kind() {
        let err = Error::Parse(ParseError::new("boom"));
        let envelope = ErrorEnvelope::from(&err);
        assert_eq!(envelope.kind, "parse");
    }

    #[test]
    fn envelope_reports_runtime_kind() {
        let err = Error::Analysis(AnalysisError::new("boom"));
        let envelope = ErrorEnvelope::from(&err);
        assert_eq!(envelope.kind, "runtime");
    }
}
