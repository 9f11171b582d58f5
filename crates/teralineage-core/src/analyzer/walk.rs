//! Shared tree-walking helpers used by the structural collectors and the function
//! inventory: find every `Query` (at any nesting depth, including inside subquery
//! expressions) reachable from a statement.

use sqlparser::ast::{
    Expr, Join, JoinConstraint, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
    TableWithJoins,
};

/// Recursion guard mirroring the one used by the predicate/function-stack walkers
/// prevents stack overflow on
/// adversarially deep input.
pub(crate) const MAX_RECURSION_DEPTH: usize = 128;

pub(crate) fn for_each_query_in_statement<'a>(stmt: &'a Statement, visit: &mut dyn FnMut(&'a Query)) {
    match stmt {
        Statement::Query(query) => walk_query(query, visit, 0),
        Statement::Insert(insert) => {
            if let Some(source) = &insert.source {
                walk_query(source, visit, 0);
            }
        }
        Statement::CreateTable(create) => {
            if let Some(query) = &create.query {
                walk_query(query, visit, 0);
            }
        }
        Statement::CreateView { query, .. } => walk_query(query, visit, 0),
        Statement::Update {
            from, selection, ..
        } => {
            if let Some(from) = from {
                walk_update_from(from, visit);
            }
            if let Some(expr) = selection {
                walk_expr_subqueries(expr, visit, 0);
            }
        }
        Statement::Delete(delete) => {
            if let Some(expr) = &delete.selection {
                walk_expr_subqueries(expr, visit, 0);
            }
        }
        _ => {}
    }
}

fn walk_update_from(from: &sqlparser::ast::UpdateTableFromKind, visit: &mut dyn FnMut(&Query)) {
    use sqlparser::ast::UpdateTableFromKind;
    let tables = match from {
        UpdateTableFromKind::BeforeSet(t) | UpdateTableFromKind::AfterSet(t) => t,
    };
    for twj in tables {
        walk_table_with_joins(twj, visit, 0);
    }
}

pub(crate) fn walk_query<'a>(query: &'a Query, visit: &mut dyn FnMut(&'a Query), depth: usize) {
    if depth > MAX_RECURSION_DEPTH {
        return;
    }
    visit(query);
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            walk_query(&cte.query, visit, depth + 1);
        }
    }
    walk_set_expr(&query.body, visit, depth + 1);
}

fn walk_set_expr<'a>(set_expr: &'a SetExpr, visit: &mut dyn FnMut(&'a Query), depth: usize) {
    if depth > MAX_RECURSION_DEPTH {
        return;
    }
    match set_expr {
        SetExpr::Select(select) => walk_select(select, visit, depth + 1),
        SetExpr::Query(query) => walk_query(query, visit, depth + 1),
        SetExpr::SetOperation { left, right, .. } => {
            walk_set_expr(left, visit, depth + 1);
            walk_set_expr(right, visit, depth + 1);
        }
        SetExpr::Insert(stmt) => for_each_query_in_statement(stmt, visit),
        _ => {}
    }
}

fn walk_select<'a>(select: &'a Select, visit: &mut dyn FnMut(&'a Query), depth: usize) {
    for twj in &select.from {
        walk_table_with_joins(twj, visit, depth + 1);
    }
    for item in &select.projection {
        let expr = match item {
            SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => Some(e),
            _ => None,
        };
        if let Some(expr) = expr {
            walk_expr_subqueries(expr, visit, depth + 1);
        }
    }
    if let Some(expr) = &select.selection {
        walk_expr_subqueries(expr, visit, depth + 1);
    }
    if let Some(expr) = &select.having {
        walk_expr_subqueries(expr, visit, depth + 1);
    }
}

fn walk_table_with_joins<'a>(
    twj: &'a TableWithJoins,
    visit: &mut dyn FnMut(&'a Query),
    depth: usize,
) {
    walk_table_factor(&twj.relation, visit, depth + 1);
    for join in &twj.joins {
        walk_join(join, visit, depth + 1);
    }
}

fn walk_join<'a>(join: &'a Join, visit: &mut dyn FnMut(&'a Query), depth: usize) {
    walk_table_factor(&join.relation, visit, depth + 1);
    if let Some(expr) = join_constraint_expr(&join.join_operator) {
        walk_expr_subqueries(expr, visit, depth + 1);
    }
}

pub(crate) fn join_constraint_expr(op: &sqlparser::ast::JoinOperator) -> Option<&Expr> {
    use sqlparser::ast::JoinOperator::*;
    let constraint = match op {
        Join(c) | Inner(c) | Left(c) | LeftOuter(c) | Right(c) | RightOuter(c) | FullOuter(c)
        | Semi(c) | LeftSemi(c) | RightSemi(c) | Anti(c) | LeftAnti(c) | RightAnti(c)
        | StraightJoin(c) => Some(c),
        AsOf { constraint, .. } => Some(constraint),
        _ => None,
    }?;
    match constraint {
        JoinConstraint::On(expr) => Some(expr),
        _ => None,
    }
}

fn walk_table_factor<'a>(tf: &'a TableFactor, visit: &mut dyn FnMut(&'a Query), depth: usize) {
    if depth > MAX_RECURSION_DEPTH {
        return;
    }
    match tf {
        TableFactor::Derived { subquery, .. } => walk_query(subquery, visit, depth + 1),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => walk_table_with_joins(table_with_joins, visit, depth + 1),
        _ => {}
    }
}

/// Descends into an expression, invoking `visit` on every `Query` reachable through a
/// subquery, `EXISTS`, or `IN (subquery)` expression.
pub(crate) fn walk_expr_subqueries<'a>(
    expr: &'a Expr,
    visit: &mut dyn FnMut(&'a Query),
    depth: usize,
) {
    if depth > MAX_RECURSION_DEPTH {
        return;
    }
    match expr {
        Expr::Subquery(q) | Expr::InSubquery { subquery: q, .. } | Expr::Exists { subquery: q, .. } => {
            walk_query(q, visit, depth + 1);
        }
        Expr::BinaryOp { left, right, .. } | Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
            walk_expr_subqueries(left, visit, depth + 1);
            walk_expr_subqueries(right, visit, depth + 1);
        }
        Expr::UnaryOp { expr, .. }
        | Expr::Nested(expr)
        | Expr::Cast { expr, .. }
        | Expr::Extract { expr, .. }
        | Expr::IsNull(expr)
        | Expr::IsNotNull(expr)
        | Expr::IsFalse(expr)
        | Expr::IsNotFalse(expr)
        | Expr::IsTrue(expr)
        | Expr::IsNotTrue(expr)
        | Expr::IsUnknown(expr)
        | Expr::IsNotUnknown(expr) => walk_expr_subqueries(expr, visit, depth + 1),
        Expr::Between { expr, low, high, .. } => {
            walk_expr_subqueries(expr, visit, depth + 1);
            walk_expr_subqueries(low, visit, depth + 1);
            walk_expr_subqueries(high, visit, depth + 1);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr_subqueries(expr, visit, depth + 1);
            for e in list {
                walk_expr_subqueries(e, visit, depth + 1);
            }
        }
        Expr::Like { expr, pattern, .. }
        | Expr::ILike { expr, pattern, .. }
        | Expr::SimilarTo { expr, pattern, .. } => {
            walk_expr_subqueries(expr, visit, depth + 1);
            walk_expr_subqueries(pattern, visit, depth + 1);
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(op) = operand {
                walk_expr_subqueries(op, visit, depth + 1);
            }
            for case_when in conditions {
                walk_expr_subqueries(&case_when.condition, visit, depth + 1);
                walk_expr_subqueries(&case_when.result, visit, depth + 1);
            }
            if let Some(e) = else_result {
                walk_expr_subqueries(e, visit, depth + 1);
            }
        }
        Expr::Function(func) => {
            if let sqlparser::ast::FunctionArguments::List(arg_list) = &func.args {
                for arg in &arg_list.args {
                    if let Some(e) = function_arg_expr(arg) {
                        walk_expr_subqueries(e, visit, depth + 1);
                    }
                }
            }
        }
        Expr::Tuple(exprs) => {
            for e in exprs {
                walk_expr_subqueries(e, visit, depth + 1);
            }
        }
        _ => {}
    }
}

/// Collects every `Subquery`/`InSubquery`/`Exists` node reachable from `expr` without
/// descending into a found subquery's own body — used for operation labeling, where
/// each such node is a *directly*-nested child of the current SELECT, and its own
/// nested subqueries are that child's concern, not this one's.
pub(crate) fn direct_subqueries_in_expr<'a>(expr: &'a Expr, out: &mut Vec<&'a Query>) {
    match expr {
        Expr::Subquery(q) | Expr::InSubquery { subquery: q, .. } | Expr::Exists { subquery: q, .. } => {
            out.push(q);
        }
        Expr::BinaryOp { left, right, .. } | Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
            direct_subqueries_in_expr(left, out);
            direct_subqueries_in_expr(right, out);
        }
        Expr::UnaryOp { expr, .. }
        | Expr::Nested(expr)
        | Expr::Cast { expr, .. }
        | Expr::Extract { expr, .. }
        | Expr::IsNull(expr)
        | Expr::IsNotNull(expr) => direct_subqueries_in_expr(expr, out),
        Expr::Between { expr, low, high, .. } => {
            direct_subqueries_in_expr(expr, out);
            direct_subqueries_in_expr(low, out);
            direct_subqueries_in_expr(high, out);
        }
        Expr::InList { expr, list, .. } => {
            direct_subqueries_in_expr(expr, out);
            for e in list {
                direct_subqueries_in_expr(e, out);
            }
        }
        Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } => {
            direct_subqueries_in_expr(expr, out);
            direct_subqueries_in_expr(pattern, out);
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
        } => {
            if let Some(op) = operand {
                direct_subqueries_in_expr(op, out);
            }
            for case_when in conditions {
                direct_subqueries_in_expr(&case_when.condition, out);
                direct_subqueries_in_expr(&case_when.result, out);
            }
            if let Some(e) = else_result {
                direct_subqueries_in_expr(e, out);
            }
        }
        _ => {}
    }
}

pub(crate) fn function_arg_expr(arg: &sqlparser::ast::FunctionArg) -> Option<&Expr> {
    use sqlparser::ast::{FunctionArg, FunctionArgExpr};
    match arg {
        FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) | FunctionArg::Named { arg: FunctionArgExpr::Expr(e), .. } => {
            Some(e)
        }
        _ => None,
    }
}
