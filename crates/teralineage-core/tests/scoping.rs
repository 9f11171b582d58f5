//! Scope-resolution edge cases: alias shadowing, CTE passthrough, and
//! derived-table column translation.

use teralineage_core::{analyze, parse_sql};

fn run(sql: &str) -> teralineage_core::Report {
    let statements = parse_sql(sql).expect("valid SQL");
    analyze(&statements, sql)
}

#[test]
fn alias_shadowing_in_subquery_resolves_to_the_innermost_binding() {
    let report = run(
        "SELECT a.id FROM t1 AS a \
         WHERE EXISTS (SELECT 1 FROM t2 AS a WHERE a.id = 10) \
         AND a.id = 20",
    );

    assert!(report.tables.contains("t1"));
    assert!(report.tables.contains("t2"));

    // the outer `a.id = 20` resolves against the outer alias (t1)
    assert!(report.variables["t1"].contains("id"));
    let outer_conditions = &report.values["t1"]["id"];
    assert!(outer_conditions
        .iter()
        .any(|c| c.value == Some(serde_json::json!(20))));

    // the inner `a.id = 10` resolves against the shadowing inner alias (t2), not t1
    assert!(report.variables["t2"].contains("id"));
    let inner_conditions = &report.values["t2"]["id"];
    assert!(inner_conditions
        .iter()
        .any(|c| c.value == Some(serde_json::json!(10))));
    assert!(!outer_conditions
        .iter()
        .any(|c| c.value == Some(serde_json::json!(10))));
}

#[test]
fn created_table_stays_excluded_from_tables_even_when_read_back_later() {
    let report = run("CREATE TABLE foo (id INT); SELECT * FROM foo;");

    assert_eq!(report.meta.statements, 2);
    assert!(report.created_objects.contains("foo"));
    // a name the script itself creates is excluded from _tables for the whole
    // script, not just within the CREATE statement
    assert!(!report.tables.contains("foo"));
    assert!(!report.variables.contains_key("foo"));
}

#[test]
fn correlated_reference_reaches_two_levels_up_through_nested_subqueries() {
    let report = run(
        "SELECT u.id FROM sales.users u \
         WHERE EXISTS (\
            SELECT 1 FROM sales.orders o WHERE EXISTS (\
                SELECT 1 FROM sales.order_items i WHERE i.order_id = o.id AND o.user_id = u.id\
            )\
         )",
    );

    assert!(report.tables.contains("sales.users"));
    assert!(report.tables.contains("sales.orders"));
    assert!(report.tables.contains("sales.order_items"));
    assert!(report.pseudocode.contains_key("Operation 1.1.1"));
    let innermost = &report.pseudocode["Operation 1.1.1"][0];
    assert!(innermost.where_.contains("sales.order_items.order_id == sales.orders.id"));
    assert!(innermost.where_.contains("sales.orders.user_id == sales.users.id"));
}

#[test]
fn cte_column_alias_passes_through_to_the_outer_query() {
    let report = run(
        "WITH renamed AS (SELECT customer_id AS cid FROM sales.orders) \
         SELECT r.cid FROM renamed r WHERE r.cid = 42",
    );

    assert!(report.ctes.contains("renamed"));
    assert!(!report.tables.contains("renamed"));
    assert!(report.tables.contains("sales.orders"));
    assert!(report.variables["sales.orders"].contains("customer_id"));

    let conditions = &report.values["sales.orders"]["customer_id"];
    assert!(conditions
        .iter()
        .any(|c| c.value == Some(serde_json::json!(42))));
}

#[test]
fn derived_table_filter_on_an_unaliased_base_column_is_still_translated() {
    let report = run(
        "SELECT s.id FROM (SELECT id FROM sales.orders WHERE status = 'OPEN') s",
    );

    assert!(report.tables.contains("sales.orders"));
    assert!(!report.tables.iter().any(|t| t == "s"));
    assert!(report.variables["sales.orders"].contains("id"));
    assert!(report.variables["sales.orders"].contains("status"));
}
