//! Literal extraction and function-stack unwrapping shared by the predicate classifier,
//! the function inventory, and the pseudocode renderer.

use crate::types::FunctionStackEntry;
use sqlparser::ast::{Expr, FunctionArguments, UnaryOperator, Value};

/// Converts a literal expression into the JSON value it should appear as in a report.
/// Returns `None` for anything that isn't a constant (a column reference, a bind
/// parameter, a further function call left un-unwrapped, etc).
pub(crate) fn literal_to_json(expr: &Expr) -> Option<serde_json::Value> {
    match expr {
        Expr::Value(v) => value_to_json(&v.value),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match literal_to_json(expr)? {
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(|f| serde_json::json!(-f))
                .or(Some(serde_json::Value::Number(n))),
            other => Some(other),
        },
        Expr::Nested(inner) => literal_to_json(inner),
        _ => None,
    }
}

fn value_to_json(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::Number(n, _) => {
            if let Ok(i) = n.parse::<i64>() {
                Some(serde_json::json!(i))
            } else {
                n.parse::<f64>().ok().map(|f| serde_json::json!(f))
            }
        }
        Value::SingleQuotedString(s)
        | Value::DoubleQuotedString(s)
        | Value::NationalStringLiteral(s)
        | Value::EscapedStringLiteral(s) => Some(serde_json::Value::String(s.clone())),
        Value::Boolean(b) => Some(serde_json::Value::Bool(*b)),
        Value::Null => Some(serde_json::Value::Null),
        Value::DollarQuotedString(_) => Some(serde_json::Value::String(value.to_string())),
        _ => None,
    }
}

/// Whether this expression is a plain column reference (possibly qualified), the base
/// case that terminates function-stack unwrapping.
pub(crate) fn is_column_ref(expr: &Expr) -> bool {
    matches!(expr, Expr::Identifier(_) | Expr::CompoundIdentifier(_))
}

/// Peels nested scalar function calls off `expr`, outermost first, collecting each
/// level's non-column arguments as literals. Stops at the first non-function,
/// non-nested expression, which is returned alongside the collected stack.
///
/// `UPPER(TRIM(t.name))` unwraps to `[{fn: "UPPER", args: []}, {fn: "TRIM", args: []}]`
/// with innermost expression `t.name`. `SUBSTR(t.name, 1, 3)` unwraps to
/// `[{fn: "SUBSTR", args: [1, 3]}]` with innermost expression `t.name` — the first
/// argument that is itself a column/function is treated as the thing being unwrapped,
/// the rest become `args`. `POSITION`/`SUBSTRING` syntax surfaces as its own
/// name-less `sqlparser` AST node rather than `Expr::Function`; [`anonymous_call_name`]
/// names that level of the stack by argument arity instead of a function identifier.
pub(crate) fn unwrap_function_stack(expr: &Expr) -> (Vec<FunctionStackEntry>, &Expr) {
    let mut stack = Vec::new();
    let mut current = expr;
    loop {
        match current {
            Expr::Nested(inner) => {
                current = inner;
            }
            Expr::Function(func) => {
                let FunctionArguments::List(arg_list) = &func.args else {
                    break;
                };
                let mut literal_args = Vec::new();
                let mut next: Option<&Expr> = None;
                for arg in &arg_list.args {
                    let Some(arg_expr) = super::walk::function_arg_expr(arg) else {
                        continue;
                    };
                    if next.is_none() && (is_column_ref(arg_expr) || matches!(arg_expr, Expr::Function(_) | Expr::Nested(_))) {
                        next = Some(arg_expr);
                    } else if let Some(lit) = literal_to_json(arg_expr) {
                        literal_args.push(lit);
                    }
                }
                stack.push(FunctionStackEntry::new(
                    func.name.to_string().to_uppercase(),
                    literal_args,
                ));
                match next {
                    Some(n) => current = n,
                    None => break,
                }
            }
            Expr::Position { expr: inner, r#in } => {
                let args = [inner.as_ref(), r#in.as_ref()];
                let (literal_args, next) = split_anonymous_args(&args);
                stack.push(FunctionStackEntry::new(anonymous_call_name(&args), literal_args));
                match next {
                    Some(n) => current = n,
                    None => break,
                }
            }
            Expr::Substring {
                expr: inner,
                substring_from,
                substring_for,
                ..
            } => {
                let mut args: Vec<&Expr> = vec![inner.as_ref()];
                if let Some(from) = substring_from {
                    args.push(from.as_ref());
                }
                if let Some(for_) = substring_for {
                    args.push(for_.as_ref());
                }
                let (literal_args, next) = split_anonymous_args(&args);
                stack.push(FunctionStackEntry::new(anonymous_call_name(&args), literal_args));
                match next {
                    Some(n) => current = n,
                    None => break,
                }
            }
            _ => break,
        }
    }
    (stack, current)
}

/// Names a call node that carries no function identifier of its own — Teradata's
/// `POSITION`/`SUBSTRING` built-ins surface this way, as dedicated `sqlparser` AST
/// variants rather than `Expr::Function` — by its argument arity: two argument nodes
/// names it `INDEX`; three with at least two numeric-literal arguments names it
/// `SUBSTR`, otherwise `OREPLACE`.
pub(crate) fn anonymous_call_name(args: &[&Expr]) -> &'static str {
    let numeric_count = args
        .iter()
        .filter(|a| matches!(literal_to_json(a), Some(v) if v.is_number()))
        .count();
    match args.len() {
        2 => "INDEX",
        3 if numeric_count >= 2 => "SUBSTR",
        3 => "OREPLACE",
        _ => "UNKNOWN",
    }
}

/// Splits an anonymous call's argument nodes the same way [`unwrap_function_stack`]
/// splits a named function's: the first argument that's itself a column reference or
/// a further call becomes the thing to keep unwrapping, the rest become literal args.
fn split_anonymous_args<'a>(args: &[&'a Expr]) -> (Vec<serde_json::Value>, Option<&'a Expr>) {
    let mut next: Option<&Expr> = None;
    let mut literal_args = Vec::new();
    for arg in args {
        if next.is_none()
            && (is_column_ref(arg)
                || matches!(
                    arg,
                    Expr::Function(_) | Expr::Nested(_) | Expr::Position { .. } | Expr::Substring { .. }
                ))
        {
            next = Some(*arg);
            continue;
        }
        if let Some(lit) = literal_to_json(arg) {
            literal_args.push(lit);
        }
    }
    (literal_args, next)
}
