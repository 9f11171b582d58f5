//! Procedure inventory: records a `CALL` statement's target. Scalar function calls
//! reached through a projection, `WHERE`, `HAVING`, or `JOIN ... ON` expression are
//! recorded by the column attributor as it walks those same trees, so there is no
//! separate scalar-function walk here.

use super::context::Accumulator;
use crate::types::FunctionEntry;
use sqlparser::ast::Statement;

/// Records a `CALL` statement's target as a procedure invocation.
pub(crate) fn record_call_statement(stmt: &Statement, acc: &mut Accumulator) {
    if let Statement::Call(func) = stmt {
        acc.record_function(FunctionEntry::procedure(func.name.to_string().to_uppercase()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::context::Accumulator;
    use crate::parser::parse_sql;

    #[test]
    fn records_call_statement_as_procedure() {
        let statements = parse_sql("CALL refresh_summary(1)").unwrap();
        let mut acc = Accumulator::new(1);
        record_call_statement(&statements[0], &mut acc);
        let report = acc.into_report();
        assert_eq!(report.functions[0].name, "REFRESH_SUMMARY");
        assert_eq!(report.functions[0].kind, crate::types::FunctionKind::Procedure);
    }
}
