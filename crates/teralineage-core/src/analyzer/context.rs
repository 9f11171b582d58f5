//! Per-run mutable accumulator.
//!
//! One `Accumulator` is created per call to [`crate::analyzer::analyze`] and owns every
//! piece of mutable state the traversal touches. Nothing escapes it except the
//! [`Report`] produced by [`Accumulator::into_report`]: each invocation allocates its
//! own state and nothing is shared across invocations.

use crate::types::{Condition, FunctionEntry, Meta, Pseudocode, QualifiedName, Report};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Names excluded from `_tables` because they are defined by this script.
#[derive(Debug, Default)]
pub(crate) struct Exclusions {
    /// Normalized CTE alias names, any nesting depth, across all statements.
    pub(crate) cte_names: HashSet<String>,
    /// Normalized names of non-temp CREATE'd objects.
    pub(crate) created_objects: HashSet<String>,
    /// Normalized names of DML write targets.
    pub(crate) write_targets: HashSet<String>,
}

impl Exclusions {
    pub(crate) fn excludes(&self, normalized: &str) -> bool {
        self.cte_names.contains(normalized)
            || self.created_objects.contains(normalized)
            || self.write_targets.contains(normalized)
    }
}

pub(crate) struct Accumulator {
    pub(crate) exclusions: Exclusions,
    tables: BTreeSet<String>,
    variables: BTreeMap<String, BTreeSet<String>>,
    values: BTreeMap<String, BTreeMap<String, Vec<Condition>>>,
    temp_tables: BTreeSet<String>,
    ctes: BTreeSet<String>,
    functions: Vec<FunctionEntry>,
    functions_seen: HashSet<(String, crate::types::FunctionKind)>,
    created_objects: BTreeSet<String>,
    write_targets: BTreeSet<String>,
    pseudocode: BTreeMap<String, Pseudocode>,
    warnings: Vec<String>,
    statement_count: usize,
    next_root_label: u32,
}

impl Accumulator {
    pub(crate) fn new(statement_count: usize) -> Self {
        Self {
            exclusions: Exclusions::default(),
            tables: BTreeSet::new(),
            variables: BTreeMap::new(),
            values: BTreeMap::new(),
            temp_tables: BTreeSet::new(),
            ctes: BTreeSet::new(),
            functions: Vec::new(),
            functions_seen: HashSet::new(),
            created_objects: BTreeSet::new(),
            write_targets: BTreeSet::new(),
            pseudocode: BTreeMap::new(),
            warnings: Vec::new(),
            statement_count,
            next_root_label: 1,
        }
    }

    pub(crate) fn next_root_label(&mut self) -> String {
        let label = self.next_root_label.to_string();
        self.next_root_label += 1;
        label
    }

    pub(crate) fn record_cte(&mut self, name: &str) {
        self.ctes.insert(name.to_string());
    }

    pub(crate) fn record_created_object(&mut self, name: &QualifiedName) {
        self.created_objects.insert(name.to_string());
    }

    pub(crate) fn record_temp_table(&mut self, name: &QualifiedName) {
        self.temp_tables.insert(name.to_string());
    }

    pub(crate) fn record_write_target(&mut self, name: &QualifiedName) {
        self.write_targets.insert(name.to_string());
    }

    /// Records a base-table reference, subject to the CTE/created-object/write-target
    /// exclusion rule.
    pub(crate) fn record_table_reference(&mut self, name: &QualifiedName) {
        if self.exclusions.excludes(&name.normalized_key()) {
            return;
        }
        self.tables.insert(name.to_string());
    }

    pub(crate) fn record_column(&mut self, table: &QualifiedName, column: &str) {
        if self.exclusions.excludes(&table.normalized_key()) {
            return;
        }
        self.variables
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string());
    }

    pub(crate) fn record_condition(&mut self, table: &QualifiedName, column: &str, condition: Condition) {
        if self.exclusions.excludes(&table.normalized_key()) {
            return;
        }
        let bucket = self
            .values
            .entry(table.to_string())
            .or_default()
            .entry(column.to_string())
            .or_default();
        let key = condition.canonical_key();
        if !bucket.iter().any(|c| c.canonical_key() == key) {
            bucket.push(condition);
        }
    }

    pub(crate) fn record_function(&mut self, entry: FunctionEntry) {
        if self.functions_seen.insert(entry.dedup_key()) {
            self.functions.push(entry);
        }
    }

    pub(crate) fn record_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Stores rendered pseudocode under `"Operation <label>"`, the key format the
    /// report's `_pseudocode` map uses.
    pub(crate) fn record_pseudocode(&mut self, label: &str, pseudocode: Pseudocode) {
        self.pseudocode.insert(format!("Operation {label}"), pseudocode);
    }

    pub(crate) fn into_report(mut self) -> Report {
        for conditions in self.values.values_mut() {
            for list in conditions.values_mut() {
                list.sort_by(|a, b| a.canonical_key().cmp(&b.canonical_key()));
            }
        }
        Report {
            tables: self.tables,
            variables: self.variables,
            values: self.values,
            temp_tables: self.temp_tables,
            ctes: self.ctes,
            functions: self.functions,
            created_objects: self.created_objects,
            write_targets: self.write_targets,
            pseudocode: self
                .pseudocode
                .into_iter()
                .map(|(label, code)| (label, vec![code]))
                .collect(),
            warnings: self.warnings,
            meta: Meta {
                statements: self.statement_count,
                dialect: "teradata".to_string(),
            },
        }
    }
}
