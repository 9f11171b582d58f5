//! Statement/query visitor: the traversal that ties scope resolution, column
//! attribution, predicate classification, and pseudocode rendering together into one
//! pass per statement. A top-level `SELECT` (or the query feeding an `INSERT`, a
//! `CREATE TABLE ... AS SELECT`, or a view definition) gets a root operation label;
//! each CTE and each directly-nested subquery gets a dotted child label in source
//! order, assigned before that subquery's own body is visited.
//!
//! `UPDATE`/`DELETE`/`MERGE` predicates are classified against a flat scope built from
//! their own table references — these statements aren't part of the labeled-SELECT
//! hierarchy the spec's worked scenarios describe, and tracing a derived-table
//! passthrough for a write statement's target has no well-defined meaning here. Any
//! subquery reachable from their predicate (or, for `MERGE`, a derived `USING` source)
//! is still visited and given its own root operation label, so `_tables` stays complete
//! even though the DML statement itself never gets a pseudocode entry.

use super::attribution;
use super::context::Accumulator;
use super::functions::record_call_statement;
use super::labels::ChildLabels;
use super::predicates;
use super::render::{self, ExistsLabels};
use super::scope::{ResolvedScopes, Scope};
use super::walk::{direct_subqueries_in_expr, join_constraint_expr};
use crate::types::{Pseudocode, QualifiedName};
use sqlparser::ast::{
    Delete, Expr, FromTable, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
    TableWithJoins,
};
use std::collections::HashMap;

/// What's known about one CTE after its own body has been visited: the single base
/// table it passes through, if any, and its traced output-column map, used to resolve
/// both unqualified references to it and qualified references through a renamed column.
#[derive(Default, Clone)]
struct CteInfo {
    single_base: Option<QualifiedName>,
    projected_columns: HashMap<String, (QualifiedName, String)>,
}

/// Maps a normalized CTE name to what's known about its resolved body.
type CteBases = HashMap<String, CteInfo>;

/// Computes a SELECT's own output-column map from its projection list: for each item
/// that's a plain (possibly qualified) column reference, traces it through `scope` to
/// its real base column and records it under the item's output name. Non-column
/// projection items (function calls, literals, `*`) contribute nothing — a reference
/// to them through an enclosing derived table or CTE alias simply won't translate.
fn compute_projected_columns(
    select: &Select,
    scope: &Scope,
    ancestors: &ResolvedScopes,
) -> HashMap<String, (QualifiedName, String)> {
    let mut out = HashMap::new();
    for item in &select.projection {
        let (expr, output_name) = match item {
            SelectItem::UnnamedExpr(e) => (e, column_display_name(e)),
            SelectItem::ExprWithAlias { expr, alias } => (expr, Some(alias.value.clone())),
            _ => continue,
        };
        let Some(output_name) = output_name else { continue };
        let (qualifier, column) = match expr {
            Expr::Identifier(ident) => (None, ident.value.clone()),
            Expr::CompoundIdentifier(parts) if parts.len() >= 2 => (
                Some(parts[parts.len() - 2].value.clone()),
                parts[parts.len() - 1].value.clone(),
            ),
            _ => continue,
        };
        if let Some(resolved) = scope.resolve_column(qualifier.as_deref(), &column, ancestors) {
            out.insert(output_name.to_lowercase(), resolved);
        }
    }
    out
}

fn column_display_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|p| p.value.clone()),
        _ => None,
    }
}

pub(crate) fn visit_statement(stmt: &Statement, acc: &mut Accumulator) {
    record_call_statement(stmt, acc);
    match stmt {
        Statement::Query(query) => {
            let label = acc.next_root_label();
            let mut cte_bases = CteBases::new();
            visit_query(query, acc, &mut cte_bases, &ResolvedScopes::default(), &label);
        }
        Statement::Insert(insert) => {
            if let Some(source) = &insert.source {
                let label = acc.next_root_label();
                let mut cte_bases = CteBases::new();
                visit_query(source, acc, &mut cte_bases, &ResolvedScopes::default(), &label);
            }
        }
        Statement::CreateTable(create) => {
            if let Some(query) = &create.query {
                let label = acc.next_root_label();
                let mut cte_bases = CteBases::new();
                visit_query(query, acc, &mut cte_bases, &ResolvedScopes::default(), &label);
            }
        }
        Statement::CreateView { query, .. } => {
            let label = acc.next_root_label();
            let mut cte_bases = CteBases::new();
            visit_query(query, acc, &mut cte_bases, &ResolvedScopes::default(), &label);
        }
        Statement::Update {
            table,
            from,
            selection,
            ..
        } => {
            let mut scope = Scope::default();
            add_table_with_joins(table, &mut scope, acc);
            if let Some(from) = from {
                add_update_from(from, &mut scope, acc);
            }
            scope.finalize();
            visit_flat_predicate(selection.as_ref(), &scope, acc);
        }
        Statement::Delete(delete) => {
            let scope = flat_scope_for_delete(delete, acc);
            visit_flat_predicate(delete.selection.as_ref(), &scope, acc);
        }
        Statement::Merge { table, source, on, .. } => {
            let mut scope = Scope::default();
            add_table_factor(table, &mut scope, acc);
            add_table_factor_with_subqueries(source, &mut scope, acc);
            scope.finalize();
            visit_flat_predicate(Some(on), &scope, acc);
        }
        _ => {}
    }
}

/// Attributes and classifies a flat (non-SELECT) statement's predicate expression, then
/// visits any directly-nested subquery it contains (e.g. `WHERE id IN (SELECT ...)`) as
/// its own root-labeled statement, since `UPDATE`/`DELETE`/`MERGE` have no enclosing
/// SELECT scope to descend from.
fn visit_flat_predicate(expr: Option<&sqlparser::ast::Expr>, scope: &Scope, acc: &mut Accumulator) {
    let Some(expr) = expr else { return };
    let ancestors = ResolvedScopes::default();
    attribution::process_expr(expr, scope, &ancestors, acc);
    predicates::classify(expr, scope, &ancestors, acc);

    let mut direct_queries = Vec::new();
    direct_subqueries_in_expr(expr, &mut direct_queries);
    for q in direct_queries {
        let label = acc.next_root_label();
        let mut cte_bases = CteBases::new();
        visit_query(q, acc, &mut cte_bases, &ResolvedScopes::default(), &label);
    }
}

/// Like [`add_table_factor`], but a `Derived` source (e.g. `MERGE ... USING (SELECT ...) src`)
/// is visited as its own root-labeled statement instead of falling back to an unresolved item.
fn add_table_factor_with_subqueries(tf: &TableFactor, scope: &mut Scope, acc: &mut Accumulator) {
    if let TableFactor::Derived { subquery, alias, .. } = tf {
        let label = acc.next_root_label();
        let mut cte_bases = CteBases::new();
        let child_scope = visit_query(subquery, acc, &mut cte_bases, &ResolvedScopes::default(), &label);
        let alias_name = alias.as_ref().map(|a| a.name.value.clone());
        match child_scope.single_base {
            Some(base) => scope.add_table_item(alias_name.as_deref(), base),
            None => scope.add_unresolved_item(),
        }
        return;
    }
    add_table_factor(tf, scope, acc);
}

fn add_table_with_joins(twj: &TableWithJoins, scope: &mut Scope, acc: &mut Accumulator) {
    add_table_factor(&twj.relation, scope, acc);
    for join in &twj.joins {
        add_table_factor(&join.relation, scope, acc);
    }
}

fn add_update_from(from: &sqlparser::ast::UpdateTableFromKind, scope: &mut Scope, acc: &mut Accumulator) {
    use sqlparser::ast::UpdateTableFromKind;
    let tables = match from {
        UpdateTableFromKind::BeforeSet(t) | UpdateTableFromKind::AfterSet(t) => t,
    };
    for twj in tables {
        add_table_with_joins(twj, scope, acc);
    }
}

/// Registers a plain table reference into both the local flat scope (for column
/// resolution) and the accumulator's `_tables` set (self-excluding if it's the
/// statement's own write target, a CTE, or a created object).
fn add_table_factor(tf: &TableFactor, scope: &mut Scope, acc: &mut Accumulator) {
    match tf {
        TableFactor::Table { name, alias, .. } => {
            let qname = QualifiedName::parse(&name.to_string());
            let alias_name = alias.as_ref().map(|a| a.name.value.clone());
            acc.record_table_reference(&qname);
            scope.add_table_item(alias_name.as_deref(), qname);
        }
        TableFactor::NestedJoin { table_with_joins, .. } => {
            add_table_with_joins(table_with_joins, scope, acc)
        }
        _ => scope.add_unresolved_item(),
    }
}

fn flat_scope_for_delete(delete: &Delete, acc: &mut Accumulator) -> Scope {
    let mut scope = Scope::default();
    for object_name in &delete.tables {
        let qname = QualifiedName::parse(&object_name.to_string());
        acc.record_table_reference(&qname);
        scope.add_table_item(None, qname);
    }
    if delete.tables.is_empty() {
        let tables = match &delete.from {
            FromTable::WithFromKeyword(ts) | FromTable::WithoutKeyword(ts) => ts,
        };
        for twj in tables {
            add_table_with_joins(twj, &mut scope, acc);
        }
    }
    if let Some(using) = &delete.using {
        for twj in using {
            add_table_with_joins(twj, &mut scope, acc);
        }
    }
    scope.finalize();
    scope
}

/// Visits one `Query`: assigns its CTEs' child labels (in declaration order, before
/// the main body), registers each CTE's traced single-base passthrough, then
/// delegates to the body. Returns the scope the body resolved, so a derived table or
/// CTE reference wrapping this query can pass through its `single_base`.
fn visit_query(
    query: &Query,
    acc: &mut Accumulator,
    cte_bases: &mut CteBases,
    ancestors: &ResolvedScopes,
    label: &str,
) -> Scope {
    let mut children = ChildLabels::new(label);
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            let child_label = children.next();
            let child_scope = visit_query(&cte.query, acc, cte_bases, ancestors, &child_label);
            let name = cte.alias.name.value.to_lowercase();
            cte_bases.insert(
                name,
                CteInfo {
                    single_base: child_scope.single_base,
                    projected_columns: child_scope.projected_columns,
                },
            );
        }
    }
    visit_set_expr(&query.body, acc, cte_bases, ancestors, label, &mut children)
}

fn visit_set_expr(
    set_expr: &SetExpr,
    acc: &mut Accumulator,
    cte_bases: &mut CteBases,
    ancestors: &ResolvedScopes,
    label: &str,
    children: &mut ChildLabels,
) -> Scope {
    match set_expr {
        SetExpr::Select(select) => visit_select(select, acc, cte_bases, ancestors, label, children),
        SetExpr::Query(query) => visit_query(query, acc, cte_bases, ancestors, label),
        SetExpr::SetOperation { left, right, .. } => {
            // A UNION/INTERSECT/EXCEPT's two arms share this label; neither side's
            // single_base is authoritative for the combined result, so the union
            // itself is never treated as a single-base passthrough source.
            visit_set_expr(left, acc, cte_bases, ancestors, label, children);
            visit_set_expr(right, acc, cte_bases, ancestors, label, children);
            Scope::default()
        }
        _ => Scope::default(),
    }
}

fn visit_select(
    select: &Select,
    acc: &mut Accumulator,
    cte_bases: &mut CteBases,
    ancestors: &ResolvedScopes,
    label: &str,
    children: &mut ChildLabels,
) -> Scope {
    let mut scope = Scope::default();
    for twj in &select.from {
        visit_table_with_joins(twj, acc, cte_bases, ancestors, children, &mut scope);
    }
    scope.finalize();

    let nested_ancestors = ancestors.child(&scope);
    scope.projected_columns = compute_projected_columns(select, &scope, &nested_ancestors);

    let mut direct_queries = Vec::new();
    for item in &select.projection {
        if let SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } = item {
            direct_subqueries_in_expr(e, &mut direct_queries);
        }
    }
    if let Some(e) = &select.selection {
        direct_subqueries_in_expr(e, &mut direct_queries);
    }
    if let Some(e) = &select.having {
        direct_subqueries_in_expr(e, &mut direct_queries);
    }

    let mut exists_labels = ExistsLabels::new();
    for q in direct_queries {
        let child_label = children.next();
        exists_labels.insert(render::query_identity(q), child_label.clone());
        visit_query(q, acc, cte_bases, &nested_ancestors, &child_label);
    }

    attribution::attribute_projection(select, &scope, &nested_ancestors, acc);
    if let sqlparser::ast::GroupByExpr::Expressions(exprs, _) = &select.group_by {
        for e in exprs {
            attribution::process_expr(e, &scope, &nested_ancestors, acc);
        }
    }
    if let Some(e) = &select.selection {
        attribution::process_expr(e, &scope, &nested_ancestors, acc);
        predicates::classify(e, &scope, &nested_ancestors, acc);
    }
    if let Some(e) = &select.having {
        attribution::process_expr(e, &scope, &nested_ancestors, acc);
        predicates::classify(e, &scope, &nested_ancestors, acc);
    }
    for twj in &select.from {
        for join in &twj.joins {
            if let Some(on) = join_constraint_expr(&join.join_operator) {
                attribution::process_expr(on, &scope, &nested_ancestors, acc);
                predicates::classify(on, &scope, &nested_ancestors, acc);
            }
        }
    }

    let pseudocode = Pseudocode {
        join: render::render_join(select, &scope, &nested_ancestors, &exists_labels),
        where_: select
            .selection
            .as_ref()
            .map(|e| render::render_expr(e, &scope, &nested_ancestors, &exists_labels))
            .unwrap_or_default(),
        having: select
            .having
            .as_ref()
            .map(|e| render::render_expr(e, &scope, &nested_ancestors, &exists_labels))
            .unwrap_or_default(),
    };
    acc.record_pseudocode(label, pseudocode);

    scope
}

fn visit_table_with_joins(
    twj: &TableWithJoins,
    acc: &mut Accumulator,
    cte_bases: &mut CteBases,
    ancestors: &ResolvedScopes,
    children: &mut ChildLabels,
    scope: &mut Scope,
) {
    visit_table_factor(&twj.relation, acc, cte_bases, ancestors, children, scope);
    for join in &twj.joins {
        visit_table_factor(&join.relation, acc, cte_bases, ancestors, children, scope);
    }
}

fn visit_table_factor(
    tf: &TableFactor,
    acc: &mut Accumulator,
    cte_bases: &mut CteBases,
    ancestors: &ResolvedScopes,
    children: &mut ChildLabels,
    scope: &mut Scope,
) {
    match tf {
        TableFactor::Table { name, alias, .. } => {
            let qname = QualifiedName::parse(&name.to_string());
            let alias_name = alias.as_ref().map(|a| a.name.value.clone());
            let cte_key = (qname.catalog.is_none() && qname.schema.is_none())
                .then(|| qname.base.to_lowercase());
            match cte_key.and_then(|k| cte_bases.get(&k).cloned()) {
                Some(info) => {
                    let key = alias_name.clone().unwrap_or_else(|| qname.base.clone());
                    if !info.projected_columns.is_empty() {
                        scope.add_column_map(&key, info.projected_columns);
                    }
                    match info.single_base {
                        Some(base) => scope.add_table_item(alias_name.as_deref(), base),
                        None => scope.add_unresolved_item(),
                    }
                }
                None => {
                    acc.record_table_reference(&qname);
                    scope.add_table_item(alias_name.as_deref(), qname);
                }
            }
        }
        TableFactor::Derived { subquery, alias, .. } => {
            let child_label = children.next();
            let child_scope = visit_query(subquery, acc, cte_bases, ancestors, &child_label);
            let alias_name = alias.as_ref().map(|a| a.name.value.clone());
            if let Some(key) = &alias_name {
                if !child_scope.projected_columns.is_empty() {
                    scope.add_column_map(key, child_scope.projected_columns);
                }
            }
            match child_scope.single_base {
                Some(base) => scope.add_table_item(alias_name.as_deref(), base),
                None => scope.add_unresolved_item(),
            }
        }
        TableFactor::NestedJoin { table_with_joins, .. } => {
            visit_table_with_joins(table_with_joins, acc, cte_bases, ancestors, children, scope);
        }
        _ => scope.add_unresolved_item(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_sql;

    fn run(sql: &str) -> crate::types::Report {
        let statements = parse_sql(sql).unwrap();
        let mut acc = Accumulator::new(statements.len());
        for stmt in &statements {
            visit_statement(stmt, &mut acc);
        }
        acc.into_report()
    }

    #[test]
    fn simple_select_gets_root_label_and_pseudocode() {
        let report = run("SELECT id FROM sales.orders o WHERE o.id > 10");
        assert!(report.pseudocode.contains_key("Operation 1"));
        let code = &report.pseudocode["Operation 1"][0];
        assert_eq!(code.where_, "(sales.orders.id > 10)");
    }

    #[test]
    fn join_condition_renders_qualified() {
        let report = run(
            "SELECT 1 FROM sales.orders o JOIN sales.order_items i ON o.order_id = i.order_id",
        );
        let code = &report.pseudocode["Operation 1"][0];
        assert_eq!(code.join, "(sales.orders.order_id == sales.order_items.order_id)");
    }

    #[test]
    fn subquery_gets_child_label_and_exists_reference() {
        let report = run(
            "SELECT 1 FROM sales.orders o WHERE EXISTS (SELECT 1 FROM sales.returns r WHERE r.order_id = o.id)",
        );
        assert!(report.pseudocode.contains_key("Operation 1.1"));
        let code = &report.pseudocode["Operation 1"][0];
        assert!(code.where_.contains("EXISTS(Operation 1.1)"));
    }

    #[test]
    fn cte_passthrough_resolves_unqualified_reference() {
        let report = run("WITH recent AS (SELECT * FROM sales.orders) SELECT id FROM recent");
        assert!(report.tables.contains("sales.orders"));
        assert!(report.variables.get("sales.orders").unwrap().contains("id"));
    }
}
