//! SQL text to AST convenience layer.
//!
//! The lineage engine itself is AST-in, AST-out (see [`crate::analyzer::analyze`]): the
//! Teradata-tagged parser that turns SQL text into statement trees is an external
//! collaborator. This module exists only so the CLI surface and this crate's own tests
//! have a real parser to call, and uses `sqlparser`'s generic dialect as an
//! approximation — `sqlparser` has no dedicated Teradata grammar, so Teradata-only
//! constructs (`VOLATILE`, `WITH DATA ON COMMIT PRESERVE ROWS`, and similar) may not
//! round-trip through it. The analyzer's structural collectors compensate for
//! some of this by scanning rendered SQL text for such tokens rather than relying solely
//! on dedicated AST attributes.

use crate::error::ParseError;
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Parses one or more `;`-separated statements using the generic dialect.
pub fn parse_sql(sql: &str) -> Result<Vec<Statement>, ParseError> {
    Parser::parse_sql(&GenericDialect {}, sql).map_err(ParseError::from)
}
