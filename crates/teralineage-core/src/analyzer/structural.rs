//! Structural collectors: a single pass over every statement that gathers the facts
//! needed before scope resolution can begin — CTE names at any nesting depth, created
//! and temp-table names, and DML write targets. Populates [`Accumulator::exclusions`]
//! so that later passes never attribute a self-defined name to `_tables`.

use super::context::Accumulator;
use super::walk::for_each_query_in_statement;
use crate::types::QualifiedName;
use sqlparser::ast::{FromTable, Statement};

const TEMP_TOKENS: [&str; 3] = ["VOLATILE", "GLOBAL TEMPORARY", "TEMPORARY"];

pub(crate) fn collect(statements: &[Statement], source: &str, acc: &mut Accumulator) {
    let upper_source = source.to_uppercase();
    for stmt in statements {
        collect_cte_names(stmt, acc);
        collect_created_objects(stmt, &upper_source, acc);
        collect_write_targets(stmt, acc);
    }
}

/// Walks every `Query` reachable from `stmt` (any nesting depth, including inside
/// subquery expressions) and records each CTE alias it defines.
fn collect_cte_names(stmt: &Statement, acc: &mut Accumulator) {
    for_each_query_in_statement(stmt, &mut |query| {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                let name = cte.alias.name.value.clone();
                acc.record_cte(&name);
                acc.exclusions.cte_names.insert(name.to_lowercase());
            }
        }
    });
}

/// `CREATE TABLE`/`CREATE VIEW` targets. Teradata's `VOLATILE`/`GLOBAL TEMPORARY`
/// qualifiers aren't modeled as dedicated AST fields by the generic-dialect parser, so
/// a temp table is recognized either by `sqlparser`'s own `temporary` flag or by a
/// token scan over the script's source text. The scan runs over the whole input rather
/// than a per-statement slice — `sqlparser` doesn't expose per-statement source spans —
/// so a `VOLATILE` elsewhere in a multi-statement script can over-trigger; acceptable
/// given how rarely a script mixes volatile and permanent `CREATE TABLE`s.
fn collect_created_objects(stmt: &Statement, upper_source: &str, acc: &mut Accumulator) {
    let looks_temp = TEMP_TOKENS.iter().any(|tok| upper_source.contains(tok));
    match stmt {
        Statement::CreateTable(create) => {
            let name = QualifiedName::parse(&create.name.to_string());
            if create.temporary || looks_temp {
                acc.record_temp_table(&name);
            } else {
                acc.exclusions.created_objects.insert(name.normalized_key());
                acc.record_created_object(&name);
            }
        }
        Statement::CreateView {
            name, temporary, ..
        } => {
            let name = QualifiedName::parse(&name.to_string());
            if *temporary || looks_temp {
                acc.record_temp_table(&name);
            } else {
                acc.exclusions.created_objects.insert(name.normalized_key());
                acc.record_created_object(&name);
            }
        }
        _ => {}
    }
}

/// `INSERT`/`UPDATE`/`DELETE`/`MERGE` targets. Recorded into `_write_targets` and
/// excluded from `_tables`; the statement's own source subtree (the `INSERT ... SELECT`
/// body, the `USING` clause, etc.) is walked separately and is not affected by this
/// exclusion — only the target itself is.
fn collect_write_targets(stmt: &Statement, acc: &mut Accumulator) {
    match stmt {
        Statement::Insert(insert) => {
            let name = QualifiedName::parse(&insert.table.to_string());
            exclude_and_record_target(acc, &name);
        }
        Statement::Update { table, .. } => {
            if let Some(name) = table_with_joins_base_name(table) {
                exclude_and_record_target(acc, &name);
            }
        }
        Statement::Delete(delete) => {
            for object_name in &delete.tables {
                let name = QualifiedName::parse(&object_name.to_string());
                exclude_and_record_target(acc, &name);
            }
            if delete.tables.is_empty() {
                let tables = match &delete.from {
                    FromTable::WithFromKeyword(ts) | FromTable::WithoutKeyword(ts) => ts,
                };
                for twj in tables {
                    if let Some(name) = table_with_joins_base_name(twj) {
                        exclude_and_record_target(acc, &name);
                    }
                }
            }
        }
        Statement::Merge { table, .. } => {
            if let Some(name) = table_factor_base_name(table) {
                exclude_and_record_target(acc, &name);
            }
        }
        _ => {}
    }
}

fn exclude_and_record_target(acc: &mut Accumulator, name: &QualifiedName) {
    acc.exclusions.write_targets.insert(name.normalized_key());
    acc.record_write_target(name);
}

fn table_with_joins_base_name(twj: &sqlparser::ast::TableWithJoins) -> Option<QualifiedName> {
    table_factor_base_name(&twj.relation)
}

fn table_factor_base_name(tf: &sqlparser::ast::TableFactor) -> Option<QualifiedName> {
    match tf {
        sqlparser::ast::TableFactor::Table { name, .. } => {
            Some(QualifiedName::parse(&name.to_string()))
        }
        _ => None,
    }
}
