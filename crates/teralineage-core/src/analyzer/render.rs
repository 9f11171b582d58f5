//! Expression/pseudocode rendering: turns the JOIN/WHERE/HAVING clauses of one SELECT
//! into the qualified, human-readable strings that land in `_pseudocode`. Columns are
//! rendered as `<base-table>.<column>` via the same resolver used for attribution;
//! comparisons and logical connectives are parenthesized and `=` renders as `==`.

use super::scope::{ResolvedScopes, Scope};
use super::walk::join_constraint_expr;
use regex::Regex;
use sqlparser::ast::{BinaryOperator, Expr, Select, UnaryOperator};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Maps the identity of an `Exists`/`InSubquery`/`Subquery` AST node (its address) to
/// the operation label assigned to it, so `EXISTS (...)` can render as
/// `EXISTS(Operation <label>)` per the spec's fallback-free happy path.
pub(crate) type ExistsLabels = HashMap<usize, String>;

pub(crate) fn query_identity(query: &sqlparser::ast::Query) -> usize {
    query as *const _ as usize
}

/// Renders every JOIN's `ON` condition in `select.from`, qualified, joined by `AND`.
pub(crate) fn render_join(
    select: &Select,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    labels: &ExistsLabels,
) -> String {
    let mut conditions = Vec::new();
    for twj in &select.from {
        for join in &twj.joins {
            if let Some(on) = join_constraint_expr(&join.join_operator) {
                conditions.push(render_expr(on, scope, ancestors, labels));
            }
        }
    }
    conditions.join(" AND ")
}

pub(crate) fn render_expr(
    expr: &Expr,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    labels: &ExistsLabels,
) -> String {
    match expr {
        Expr::Identifier(ident) => render_column(None, &ident.value, scope, ancestors),
        Expr::CompoundIdentifier(parts) => {
            let column = parts.last().map(|p| p.value.as_str()).unwrap_or_default();
            let qualifier = if parts.len() > 1 {
                Some(parts[parts.len() - 2].value.as_str())
            } else {
                None
            };
            render_column(qualifier, column, scope, ancestors)
        }
        Expr::Value(v) => v.value.to_string(),
        Expr::Nested(inner) => render_expr(inner, scope, ancestors, labels),
        Expr::UnaryOp { op, expr } => {
            format!("{}{}", render_unary_op(op), render_expr(expr, scope, ancestors, labels))
        }
        Expr::BinaryOp { left, op, right } => format!(
            "({} {} {})",
            render_expr(left, scope, ancestors, labels),
            render_binary_op(op),
            render_expr(right, scope, ancestors, labels)
        ),
        Expr::Between {
            expr,
            negated,
            low,
            high,
        } => format!(
            "({} {}BETWEEN {} AND {})",
            render_expr(expr, scope, ancestors, labels),
            if *negated { "NOT " } else { "" },
            render_expr(low, scope, ancestors, labels),
            render_expr(high, scope, ancestors, labels)
        ),
        Expr::InList {
            expr,
            list,
            negated,
        } => format!(
            "({} {}IN ({}))",
            render_expr(expr, scope, ancestors, labels),
            if *negated { "NOT " } else { "" },
            list.iter()
                .map(|e| render_expr(e, scope, ancestors, labels))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Expr::InSubquery {
            expr,
            negated,
            subquery,
        } => {
            let inner = labels
                .get(&query_identity(subquery))
                .map(|l| format!("Operation {l}"))
                .unwrap_or_else(|| "subquery".to_string());
            format!(
                "({} {}IN ({inner}))",
                render_expr(expr, scope, ancestors, labels),
                if *negated { "NOT " } else { "" }
            )
        }
        Expr::Like {
            expr,
            negated,
            pattern,
            ..
        } => format!(
            "({} {}LIKE {})",
            render_expr(expr, scope, ancestors, labels),
            if *negated { "NOT " } else { "" },
            render_expr(pattern, scope, ancestors, labels)
        ),
        Expr::IsNull(e) => format!("({} IS NULL)", render_expr(e, scope, ancestors, labels)),
        Expr::IsNotNull(e) => format!("({} IS NOT NULL)", render_expr(e, scope, ancestors, labels)),
        Expr::Exists { negated, subquery } => {
            let label = labels.get(&query_identity(subquery));
            match label {
                Some(l) => format!(
                    "{}EXISTS(Operation {l})",
                    if *negated { "NOT " } else { "" }
                ),
                None => format!("{}EXISTS(subquery)", if *negated { "NOT " } else { "" }),
            }
        }
        Expr::Subquery(q) => labels
            .get(&query_identity(q))
            .map(|l| format!("(Operation {l})"))
            .unwrap_or_else(|| "(subquery)".to_string()),
        Expr::Function(func) => render_function(func, scope, ancestors, labels),
        Expr::Case {
            operand,
            conditions,
            else_result,
        } => {
            let mut s = String::from("CASE");
            if let Some(op) = operand {
                s.push(' ');
                s.push_str(&render_expr(op, scope, ancestors, labels));
            }
            for case_when in conditions {
                s.push_str(&format!(
                    " WHEN {} THEN {}",
                    render_expr(&case_when.condition, scope, ancestors, labels),
                    render_expr(&case_when.result, scope, ancestors, labels)
                ));
            }
            if let Some(e) = else_result {
                s.push_str(&format!(" ELSE {}", render_expr(e, scope, ancestors, labels)));
            }
            s.push_str(" END");
            s
        }
        Expr::Extract { field, expr, .. } => format!(
            "EXTRACT({field} FROM {})",
            render_expr(expr, scope, ancestors, labels)
        ),
        other => substitute_alias_columns(&other.to_string(), scope, ancestors),
    }
}

/// Fallback rendering for any expression shape not given its own arm above: prints
/// `sqlparser`'s own `Display` output, then re-qualifies every `alias.column` token it
/// finds against `scope` so the fallback still reads in terms of base tables rather
/// than the query's own aliases. A token that doesn't resolve (not a real
/// alias/column pair, or a schema-qualified literal that only looks like one) is left
/// as-is.
fn substitute_alias_columns(rendered: &str, scope: &Scope, ancestors: &ResolvedScopes) -> String {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let re = TOKEN.get_or_init(|| {
        Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\b").unwrap()
    });
    re.replace_all(rendered, |caps: &regex::Captures| {
        let qualifier = &caps[1];
        let column = &caps[2];
        match scope.resolve_column(Some(qualifier), column, ancestors) {
            Some((base, real_column)) => format!("{base}.{real_column}"),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

fn render_column(qualifier: Option<&str>, column: &str, scope: &Scope, ancestors: &ResolvedScopes) -> String {
    match scope.resolve_column(qualifier, column, ancestors) {
        Some((base, real_column)) => format!("{base}.{real_column}"),
        None => match qualifier {
            Some(q) => format!("{q}.{column}"),
            None => column.to_string(),
        },
    }
}

fn render_function(
    func: &sqlparser::ast::Function,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    labels: &ExistsLabels,
) -> String {
    let name = canonicalize_function_name(&func.name.to_string());
    if matches!(name.as_str(), "CURRENT_DATE" | "CURRENT_TIMESTAMP" | "CURRENT_TIME") {
        return name;
    }
    let mut args = Vec::new();
    if let sqlparser::ast::FunctionArguments::List(arg_list) = &func.args {
        for arg in &arg_list.args {
            if let Some(expr) = super::walk::function_arg_expr(arg) {
                args.push(render_expr(expr, scope, ancestors, labels));
            }
        }
    }
    format!("{name}({})", args.join(", "))
}

/// The canonicalization table.
pub(crate) fn canonicalize_function_name(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "substring" => "SUBSTR".to_string(),
        "char_length" => "LENGTH".to_string(),
        "current_date" | "currentdate" => "CURRENT_DATE".to_string(),
        "current_timestamp" => "CURRENT_TIMESTAMP".to_string(),
        "current_time" => "CURRENT_TIME".to_string(),
        _ => raw.to_uppercase(),
    }
}

fn render_unary_op(op: &UnaryOperator) -> &'static str {
    match op {
        UnaryOperator::Not => "NOT ",
        UnaryOperator::Minus => "-",
        UnaryOperator::Plus => "+",
        _ => "",
    }
}

fn render_binary_op(op: &BinaryOperator) -> String {
    match op {
        BinaryOperator::Eq => "==".to_string(),
        BinaryOperator::NotEq => "!=".to_string(),
        BinaryOperator::Gt => ">".to_string(),
        BinaryOperator::GtEq => ">=".to_string(),
        BinaryOperator::Lt => "<".to_string(),
        BinaryOperator::LtEq => "<=".to_string(),
        BinaryOperator::And => "AND".to_string(),
        BinaryOperator::Or => "OR".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sql;
    use sqlparser::ast::{SetExpr, Statement};

    fn select(sql: &str) -> Select {
        let statements = parse_sql(sql).unwrap();
        let Statement::Query(q) = statements.into_iter().next().unwrap() else {
            panic!()
        };
        let SetExpr::Select(s) = *q.body else {
            panic!()
        };
        *s
    }

    #[test]
    fn renders_qualified_join_condition() {
        let s = select("SELECT 1 FROM a x JOIN b y ON x.id = y.id");
        let mut scope = Scope::default();
        scope.insert_source("x", crate::types::QualifiedName::new("sales.orders"));
        scope.insert_source("y", crate::types::QualifiedName::new("sales.items"));
        let rendered = render_join(&s, &scope, &ResolvedScopes::default(), &ExistsLabels::new());
        assert_eq!(rendered, "(sales.orders.id == sales.items.id)");
    }

    #[test]
    fn renders_canonical_function_names() {
        assert_eq!(canonicalize_function_name("substring"), "SUBSTR");
        assert_eq!(canonicalize_function_name("UPPER"), "UPPER");
    }
}
