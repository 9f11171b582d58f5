//! The lineage engine: AST in, [`crate::types::Report`] out.
//!
//! [`analyze`] is the crate's single entry point. It owns no state across calls — each
//! invocation allocates its own [`context::Accumulator`], runs the structural collectors
//! once over every statement to seed the `_tables` exclusion set, then visits each
//! statement in turn, building a fresh [`scope::Scope`] per `SELECT` as it descends.
//! Nothing outlives the call; concurrent invocations need no coordination.

mod attribution;
mod context;
mod expr_support;
mod functions;
mod labels;
mod predicates;
mod render;
mod scope;
mod structural;
mod visit;
mod walk;

use context::Accumulator;
use sqlparser::ast::Statement;

/// Runs the full lineage extraction pass over a parsed script and returns the
/// aggregated report. `source` is the original SQL text, used only by the structural
/// collectors' `VOLATILE`/`TEMPORARY` token scan — the rest of the pass is AST-only.
pub fn analyze(statements: &[Statement], source: &str) -> crate::types::Report {
    let mut acc = Accumulator::new(statements.len());
    structural::collect(statements, source, &mut acc);
    for stmt in statements {
        visit::visit_statement(stmt, &mut acc);
    }
    acc.into_report()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sql;

    #[test]
    fn analyze_excludes_cte_and_write_target_from_tables() {
        let sql = "INSERT INTO sales.fact_orders \
             WITH recent AS (SELECT * FROM sales.orders) \
             SELECT id FROM recent";
        let statements = parse_sql(sql).unwrap();
        let report = analyze(&statements, sql);
        assert!(report.tables.contains("sales.orders"));
        assert!(!report.tables.contains("recent"));
        assert!(!report.tables.contains("sales.fact_orders"));
        assert!(report.write_targets.contains("sales.fact_orders"));
        assert!(report.ctes.contains("recent"));
    }

    #[test]
    fn analyze_reports_statement_count_in_meta() {
        let sql = "SELECT 1 FROM t; SELECT 2 FROM u;";
        let statements = parse_sql(sql).unwrap();
        let report = analyze(&statements, sql);
        assert_eq!(report.meta.statements, 2);
        assert_eq!(report.meta.dialect, "teradata");
    }
}
