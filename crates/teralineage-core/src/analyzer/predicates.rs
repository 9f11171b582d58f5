//! Predicate classification: turns comparison/`IN`/`BETWEEN`/`LIKE` expressions into
//! typed [`Condition`] records attributed to a `(base table, column)` pair.

use super::expr_support::{is_column_ref, literal_to_json, unwrap_function_stack};
use super::scope::{ResolvedScopes, Scope};
use crate::analyzer::context::Accumulator;
use crate::types::{Condition, Op, QualifiedName};
use sqlparser::ast::{BinaryOperator, Expr};

/// Walks `expr` (a `WHERE`/`HAVING`/`ON` tree) looking for attributable comparisons,
/// recording one [`Condition`] per match. Boolean connectives (`AND`/`OR`/`NOT`) are
/// descended into; anything else that isn't a recognized comparison shape is ignored
/// rather than rejected — lineage extraction is best-effort over arbitrary predicates.
pub(crate) fn classify(expr: &Expr, scope: &Scope, ancestors: &ResolvedScopes, acc: &mut Accumulator) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And | BinaryOperator::Or,
            right,
        } => {
            classify(left, scope, ancestors, acc);
            classify(right, scope, ancestors, acc);
        }
        Expr::UnaryOp {
            op: sqlparser::ast::UnaryOperator::Not,
            expr,
        } => classify_not(expr, scope, ancestors, acc),
        Expr::Nested(inner) => classify(inner, scope, ancestors, acc),
        Expr::BinaryOp { left, op, right } => {
            classify_comparison(left, op, right, scope, ancestors, acc);
        }
        Expr::Between {
            expr: col,
            negated: false,
            low,
            high,
        } => classify_between(col, low, high, scope, ancestors, acc),
        Expr::InList {
            expr: col,
            list,
            negated,
        } => classify_in_list(col, list, *negated, scope, ancestors, acc),
        Expr::Like {
            expr: col,
            negated,
            pattern,
            ..
        } => classify_like(col, *negated, pattern, scope, ancestors, acc),
        _ => {}
    }
}

/// `NOT`-wrapped predicates: `sqlparser` parses `NOT a.x IN (...)` and `NOT a.x LIKE
/// '...'` as a `UnaryOp{Not, ..}` around an `InList`/`Like` node whose own `negated`
/// flag is still `false`, rather than setting that flag itself — so the negation has
/// to be applied here by flipping it, not by a bare recursive `classify` call.
fn classify_not(expr: &Expr, scope: &Scope, ancestors: &ResolvedScopes, acc: &mut Accumulator) {
    match expr {
        Expr::Nested(inner) => classify_not(inner, scope, ancestors, acc),
        Expr::InList {
            expr: col,
            list,
            negated,
        } => classify_in_list(col, list, !negated, scope, ancestors, acc),
        Expr::Like {
            expr: col,
            negated,
            pattern,
            ..
        } => classify_like(col, !negated, pattern, scope, ancestors, acc),
        other => classify(other, scope, ancestors, acc),
    }
}

fn classify_between(
    col: &Expr,
    low: &Expr,
    high: &Expr,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    acc: &mut Accumulator,
) {
    if let Some((table, column, stack)) = resolve_column_side(col, scope, ancestors) {
        if let (Some(low_v), Some(high_v)) = (literal_to_json(low), literal_to_json(high)) {
            let condition = Condition::new(Op::Between)
                .with_range(low_v, high_v)
                .with_column_stack(stack);
            acc.record_condition(&table, &column, condition);
        }
    }
}

fn classify_in_list(
    col: &Expr,
    list: &[Expr],
    negated: bool,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    acc: &mut Accumulator,
) {
    if let Some((table, column, stack)) = resolve_column_side(col, scope, ancestors) {
        let mut values = Vec::new();
        let mut value_stacks = Vec::new();
        let mut any_literal = false;
        for item in list {
            let (item_stack, inner) = unwrap_function_stack(item);
            if let Some(json) = literal_to_json(inner) {
                any_literal = true;
                values.push(json);
            } else {
                values.push(serde_json::Value::Null);
            }
            value_stacks.push(item_stack);
        }
        if any_literal {
            let op = if negated { Op::NotIn } else { Op::In };
            let condition = Condition::new(op)
                .with_values(values)
                .with_column_stack(stack)
                .with_value_stack_list(value_stacks);
            acc.record_condition(&table, &column, condition);
        }
    }
}

fn classify_like(
    col: &Expr,
    negated: bool,
    pattern: &Expr,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    acc: &mut Accumulator,
) {
    if let Some((table, column, stack)) = resolve_column_side(col, scope, ancestors) {
        if let Some(value) = literal_to_json(pattern) {
            let op = if negated { Op::NotLike } else { Op::Like };
            let condition = Condition::new(op)
                .with_value(value)
                .with_column_stack(stack);
            acc.record_condition(&table, &column, condition);
        }
    }
}

fn classify_comparison(
    left: &Expr,
    op: &BinaryOperator,
    right: &Expr,
    scope: &Scope,
    ancestors: &ResolvedScopes,
    acc: &mut Accumulator,
) {
    let Some(op) = comparison_op(op) else {
        return;
    };
    if let Some((table, column, stack)) = resolve_column_side(left, scope, ancestors) {
        let (value_stack, inner) = unwrap_function_stack(right);
        if let Some(value) = literal_to_json(inner) {
            let condition = Condition::new(op)
                .with_value(value)
                .with_column_stack(stack)
                .with_value_stack(value_stack);
            acc.record_condition(&table, &column, condition);
            return;
        }
    }
    // literal OP column: flip sides, swapping the operator's direction.
    if let Some((table, column, stack)) = resolve_column_side(right, scope, ancestors) {
        let (value_stack, inner) = unwrap_function_stack(left);
        if let Some(value) = literal_to_json(inner) {
            let condition = Condition::new(flip(op))
                .with_value(value)
                .with_column_stack(stack)
                .with_value_stack(value_stack);
            acc.record_condition(&table, &column, condition);
        }
    }
}

fn comparison_op(op: &BinaryOperator) -> Option<Op> {
    match op {
        BinaryOperator::Eq => Some(Op::Eq),
        BinaryOperator::Gt => Some(Op::Gt),
        BinaryOperator::GtEq => Some(Op::Ge),
        BinaryOperator::Lt => Some(Op::Lt),
        BinaryOperator::LtEq => Some(Op::Le),
        _ => None,
    }
}

fn flip(op: Op) -> Op {
    match op {
        Op::Gt => Op::Lt,
        Op::Lt => Op::Gt,
        Op::Ge => Op::Le,
        Op::Le => Op::Ge,
        other => other,
    }
}

/// Unwraps a function stack off `expr` and resolves the innermost column reference
/// against the current scope (and, for correlated references, its ancestors).
fn resolve_column_side(
    expr: &Expr,
    scope: &Scope,
    ancestors: &ResolvedScopes,
) -> Option<(QualifiedName, String, Vec<crate::types::FunctionStackEntry>)> {
    let (stack, inner) = unwrap_function_stack(expr);
    if !is_column_ref(inner) {
        return None;
    }
    let (qualifier, column) = match inner {
        Expr::Identifier(ident) => (None, ident.value.clone()),
        Expr::CompoundIdentifier(parts) => {
            let column = parts.last()?.value.clone();
            let qualifier = if parts.len() > 1 {
                Some(parts[parts.len() - 2].value.clone())
            } else {
                None
            };
            (qualifier, column)
        }
        _ => return None,
    };
    let (table, real_column) = scope.resolve_column(qualifier.as_deref(), &column, ancestors)?;
    Some((table, real_column, stack))
}
