//! Column attributor: walks every column, star, and function-call reference in a
//! SELECT's projection/WHERE/HAVING, records each into `_variables` via the scope
//! resolver, and emits `select_star_used`/`ambiguous_column_origin` warnings.

use super::context::Accumulator;
use super::scope::{ResolvedScopes, Scope};
use crate::types::FunctionEntry;
use sqlparser::ast::{Expr, FunctionArguments, Select, SelectItem};

pub(crate) fn attribute_projection(
    select: &Select,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    acc: &mut Accumulator,
) {
    for item in &select.projection {
        match item {
            SelectItem::Wildcard(_) => attribute_bare_star(scope, acc),
            SelectItem::QualifiedWildcard(kind, _) => {
                attribute_qualified_star(&kind.to_string(), scope, ancestors, acc);
            }
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                process_expr(expr, scope, ancestors, acc);
            }
        }
    }
}

fn attribute_bare_star(scope: &Scope, acc: &mut Accumulator) {
    let tables = scope.distinct_sources();
    if tables.is_empty() {
        acc.record_warning("select_star_used: no FROM tables in scope".to_string());
        return;
    }
    for table in tables {
        acc.record_column(&table, "*");
        acc.record_warning(format!(
            "select_star_used: table {table} has '*' referenced"
        ));
    }
}

fn attribute_qualified_star(
    qualifier: &str,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    acc: &mut Accumulator,
) {
    match scope.resolve(Some(qualifier), ancestors) {
        Some(table) => acc.record_column(&table, "*"),
        None => acc.record_warning(format!(
            "ambiguous_column_origin: could not resolve qualifier '{qualifier}' for column '*'"
        )),
    }
}

/// Recursively attributes every column reference in `expr`, recording function
/// entries along the way. Does not descend into a subquery's own body — that SELECT
/// is attributed by its own visit.
pub(crate) fn process_expr(expr: &Expr, scope: &Scope, ancestors: &ResolvedScopes, acc: &mut Accumulator) {
    match expr {
        Expr::Identifier(ident) => attribute_column(None, &ident.value, scope, ancestors, acc),
        Expr::CompoundIdentifier(parts) => {
            let Some(column) = parts.last() else { return };
            let qualifier = if parts.len() > 1 {
                Some(parts[parts.len() - 2].value.as_str())
            } else {
                None
            };
            attribute_column(qualifier, &column.value, scope, ancestors, acc);
        }
        Expr::Function(func) => {
            acc.record_function(FunctionEntry::function(func.name.to_string().to_uppercase()));
            if let FunctionArguments::List(arg_list) = &func.args {
                for arg in &arg_list.args {
                    if let Some(inner) = super::walk::function_arg_expr(arg) {
                        process_expr(inner, scope, ancestors, acc);
                    }
                }
            }
        }
        Expr::Position { expr: inner, r#in } => {
            acc.record_function(FunctionEntry::function(super::expr_support::anonymous_call_name(&[
                inner, r#in,
            ])));
            process_expr(inner, scope, ancestors, acc);
            process_expr(r#in, scope, ancestors, acc);
        }
        Expr::Substring {
            expr: inner,
            substring_from,
            substring_for,
            ..
        } => {
            let mut args: Vec<&Expr> = vec![inner];
            if let Some(from) = substring_from {
                args.push(from);
            }
            if let Some(for_) = substring_for {
                args.push(for_);
            }
            acc.record_function(FunctionEntry::function(super::expr_support::anonymous_call_name(&args)));
            process_expr(inner, scope, ancestors, acc);
            if let Some(from) = substring_from {
                process_expr(from, scope, ancestors, acc);
            }
            if let Some(for_) = substring_for {
                process_expr(for_, scope, ancestors, acc);
            }
        }
        Expr::BinaryOp { left, right, .. } | Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
            process_expr(left, scope, ancestors, acc);
            process_expr(right, scope, ancestors, acc);
        }
        Expr::UnaryOp { expr, .. }
        | Expr::Nested(expr)
        | Expr::Cast { expr, .. }
        | Expr::Extract { expr, .. }
        | Expr::IsNull(expr)
        | Expr::IsNotNull(expr) => process_expr(expr, scope, ancestors, acc),
        Expr::Between { expr, low, high, .. } => {
            process_expr(expr, scope, ancestors, acc);
            process_expr(low, scope, ancestors, acc);
            process_expr(high, scope, ancestors, acc);
        }
        Expr::InList { expr, list, .. } => {
            process_expr(expr, scope, ancestors, acc);
            for e in list {
                process_expr(e, scope, ancestors, acc);
            }
        }
        Expr::InSubquery { expr, .. } => process_expr(expr, scope, ancestors, acc),
        Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } => {
            process_expr(expr, scope, ancestors, acc);
            process_expr(pattern, scope, ancestors, acc);
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
        } => {
            if let Some(op) = operand {
                process_expr(op, scope, ancestors, acc);
            }
            for case_when in conditions {
                process_expr(&case_when.condition, scope, ancestors, acc);
                process_expr(&case_when.result, scope, ancestors, acc);
            }
            if let Some(e) = else_result {
                process_expr(e, scope, ancestors, acc);
            }
        }
        Expr::Tuple(exprs) => {
            for e in exprs {
                process_expr(e, scope, ancestors, acc);
            }
        }
        // Subquery/Exists bodies are attributed by their own SELECT visit.
        Expr::Subquery(_) | Expr::Exists { .. } => {}
        _ => {}
    }
}

fn attribute_column(
    qualifier: Option<&str>,
    column: &str,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    acc: &mut Accumulator,
) {
    match scope.resolve_column(qualifier, column, ancestors) {
        Some((table, real_column)) => acc.record_column(&table, &real_column),
        None => {
            let message = match qualifier {
                Some(q) => format!(
                    "ambiguous_column_origin: could not resolve qualifier '{q}' for column '{column}'"
                ),
                None => format!("ambiguous_column_origin: could not resolve column '{column}'"),
            };
            acc.record_warning(message);
        }
    }
}
