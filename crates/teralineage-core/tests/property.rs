//! Property-based checks of the quantified invariants over randomly generated
//! join/filter shapes.

use proptest::prelude::*;
use teralineage_core::{analyze, parse_sql};

fn analyze_sql(sql: &str) -> teralineage_core::Report {
    let statements = parse_sql(sql).expect("generated SQL should parse");
    analyze(&statements, sql)
}

proptest! {
    #[test]
    fn tables_never_contain_a_cte_or_write_target(
        table_a in "[a-z]{1,8}",
        table_b in "[a-z]{1,8}",
        col_a in "[a-z]{1,8}",
        col_b in "[a-z]{1,8}",
    ) {
        prop_assume!(table_a != table_b);
        let sql = format!(
            "WITH filtered AS (SELECT {ca} FROM {ta}) \
             INSERT INTO {tb} SELECT {ca} FROM filtered JOIN {tb} ON filtered.{ca} = {tb}.{cb}",
            ta = table_a, tb = table_b, ca = col_a, cb = col_b,
        );
        let report = analyze_sql(&sql);

        prop_assert!(!report.tables.contains(&table_b));
        prop_assert!(!report.tables.contains("filtered"));
        prop_assert!(report.ctes.contains("filtered"));
        prop_assert!(report.write_targets.contains(&table_b));
    }

    #[test]
    fn every_variables_key_is_a_table(
        table in "[a-z]{1,8}",
        col in "[a-z]{1,8}",
    ) {
        let sql = format!("SELECT {col} FROM {table}");
        let report = analyze_sql(&sql);

        for key in report.variables.keys() {
            prop_assert!(report.tables.contains(key));
        }
    }

    #[test]
    fn every_values_column_appears_in_variables(
        table in "[a-z]{1,8}",
        col in "[a-z]{1,8}",
        bound in 0i64..10_000,
    ) {
        let sql = format!("SELECT {col} FROM {table} WHERE {col} = {bound}");
        let report = analyze_sql(&sql);

        for (table_name, columns) in &report.values {
            for column_name in columns.keys() {
                prop_assert!(report.variables[table_name].contains(column_name));
            }
        }
    }

    #[test]
    fn rerun_is_byte_identical(
        table_a in "[a-z]{1,8}",
        table_b in "[a-z]{1,8}",
        col in "[a-z]{1,8}",
    ) {
        prop_assume!(table_a != table_b);
        let sql = format!(
            "SELECT a.{col} FROM {ta} a JOIN {tb} b ON a.{col} = b.{col}",
            ta = table_a, tb = table_b, col = col,
        );
        let first = serde_json::to_string(&analyze_sql(&sql)).unwrap();
        let second = serde_json::to_string(&analyze_sql(&sql)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn no_duplicate_conditions_for_one_column(
        table in "[a-z]{1,8}",
        col in "[a-z]{1,8}",
        bound in 0i64..10_000,
    ) {
        // The same literal filter appears twice (OR'd); classification should dedup it.
        let sql = format!(
            "SELECT {col} FROM {table} WHERE {col} = {bound} OR {col} = {bound}"
        );
        let report = analyze_sql(&sql);

        if let Some(columns) = report.values.get(&table) {
            if let Some(conditions) = columns.get(&col) {
                let mut seen = std::collections::HashSet::new();
                for condition in conditions {
                    prop_assert!(seen.insert(condition.canonical_key()));
                }
            }
        }
    }
}
