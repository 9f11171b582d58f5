//! The aggregated output shape of a lineage run.

use schemars::JsonSchema;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One entry in a function-unwrapping stack: a canonical upper-cased name and its
/// non-column literal arguments, outermost entry first.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct FunctionStackEntry {
    #[serde(rename = "fn")]
    pub name: String,
    pub args: Vec<serde_json::Value>,
}

impl FunctionStackEntry {
    pub fn new(name: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// A predicate comparison operator, serialized exactly as it appears in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub enum Op {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "not like")]
    NotLike,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "between")]
    Between,
}

/// A single constant-value filter condition attributed to a `(base table, column)` pair.
///
/// Optional fields are omitted from JSON when empty rather than emitted as `null`,
/// except `builtin` on `FunctionEntry`, which is always emitted as a literal `null`.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Condition {
    pub op: Op,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<serde_json::Value>,
    #[serde(rename = "fn", skip_serializing_if = "Option::is_none")]
    pub fn_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fn_args: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fn_stack: Option<Vec<FunctionStackEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_fn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_fn_args: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_fn_stack: Option<Vec<FunctionStackEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_fns: Option<Vec<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_fn_args_list: Option<Vec<Vec<serde_json::Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_fn_stack_list: Option<Vec<Vec<FunctionStackEntry>>>,
}

impl Condition {
    pub fn new(op: Op) -> Self {
        Self {
            op,
            value: None,
            values: None,
            low: None,
            high: None,
            fn_: None,
            fn_args: None,
            fn_stack: None,
            value_fn: None,
            value_fn_args: None,
            value_fn_stack: None,
            value_fns: None,
            value_fn_args_list: None,
            value_fn_stack_list: None,
        }
    }

    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_values(mut self, values: Vec<serde_json::Value>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn with_range(mut self, low: serde_json::Value, high: serde_json::Value) -> Self {
        self.low = Some(low);
        self.high = Some(high);
        self
    }

    /// Attaches the column-side function stack, deriving `fn`/`fn_args` from its
    /// outermost entry (lower-cased, per the singular/stack naming convention).
    pub fn with_column_stack(mut self, stack: Vec<FunctionStackEntry>) -> Self {
        if let Some(outer) = stack.first() {
            self.fn_ = Some(outer.name.to_lowercase());
            self.fn_args = Some(outer.args.clone());
        }
        if !stack.is_empty() {
            self.fn_stack = Some(stack);
        }
        self
    }

    /// Attaches the literal-side function stack for a scalar comparison.
    pub fn with_value_stack(mut self, stack: Vec<FunctionStackEntry>) -> Self {
        if let Some(outer) = stack.first() {
            self.value_fn = Some(outer.name.to_lowercase());
            self.value_fn_args = Some(outer.args.clone());
        }
        if !stack.is_empty() {
            self.value_fn_stack = Some(stack);
        }
        self
    }

    /// Attaches the per-element literal-side function stacks for an IN/NOT IN list.
    pub fn with_value_stack_list(mut self, stacks: Vec<Vec<FunctionStackEntry>>) -> Self {
        if stacks.iter().any(|s| !s.is_empty()) {
            self.value_fns = Some(
                stacks
                    .iter()
                    .map(|s| s.first().map(|e| e.name.clone()))
                    .collect(),
            );
            self.value_fn_args_list = Some(
                stacks
                    .iter()
                    .map(|s| s.first().map(|e| e.args.clone()).unwrap_or_default())
                    .collect(),
            );
            self.value_fn_stack_list = Some(stacks);
        }
        self
    }

    /// The sort/dedup key: a stable canonical-JSON encoding.
    pub fn canonical_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// The kind of callable recorded by the function/procedure inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Function,
    Procedure,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct FunctionEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FunctionKind,
    /// Always `null`: builtin-vs-user-defined classification is not attempted.
    pub builtin: Option<bool>,
}

impl FunctionEntry {
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Function,
            builtin: None,
        }
    }

    pub fn procedure(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Procedure,
            builtin: None,
        }
    }

    pub fn dedup_key(&self) -> (String, FunctionKind) {
        (self.name.clone(), self.kind)
    }
}

/// The rendered JOIN/WHERE/HAVING pseudocode for one labeled SELECT.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct Pseudocode {
    pub join: String,
    #[serde(rename = "where")]
    pub where_: String,
    pub having: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Meta {
    pub statements: usize,
    pub dialect: String,
}

/// The single aggregated output value. Field declaration order is the
/// serialized key order.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Report {
    #[serde(rename = "_tables")]
    pub tables: BTreeSet<String>,
    #[serde(rename = "_variables")]
    pub variables: BTreeMap<String, BTreeSet<String>>,
    #[serde(rename = "_values")]
    pub values: BTreeMap<String, BTreeMap<String, Vec<Condition>>>,
    #[serde(rename = "_temp_tables")]
    pub temp_tables: BTreeSet<String>,
    #[serde(rename = "_ctes")]
    pub ctes: BTreeSet<String>,
    #[serde(rename = "_functions")]
    pub functions: Vec<FunctionEntry>,
    #[serde(rename = "_created_objects")]
    pub created_objects: BTreeSet<String>,
    #[serde(rename = "_write_targets")]
    pub write_targets: BTreeSet<String>,
    #[serde(rename = "_pseudocode")]
    pub pseudocode: BTreeMap<String, Vec<Pseudocode>>,
    #[serde(rename = "_warnings")]
    pub warnings: Vec<String>,
    #[serde(rename = "_meta")]
    pub meta: Meta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_serializes_as_literal_null() {
        let entry = FunctionEntry::function("upper");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"builtin\":null"));
    }

    #[test]
    fn op_serializes_to_spec_tokens() {
        assert_eq!(serde_json::to_string(&Op::NotIn).unwrap(), "\"not in\"");
        assert_eq!(serde_json::to_string(&Op::Ge).unwrap(), "\">=\"");
    }

    #[test]
    fn condition_omits_empty_optional_fields() {
        let cond = Condition::new(Op::Eq).with_value(serde_json::json!(117));
        let json = serde_json::to_string(&cond).unwrap();
        assert!(!json.contains("fn_stack"));
        assert!(json.contains("\"value\":117"));
    }

    #[test]
    fn column_stack_derives_singular_lowercase_fn() {
        let cond = Condition::new(Op::Eq).with_column_stack(vec![FunctionStackEntry::new(
            "UPPER",
            vec![],
        )]);
        assert_eq!(cond.fn_.as_deref(), Some("upper"));
        assert_eq!(cond.fn_stack.unwrap()[0].name, "UPPER");
    }

    #[test]
    fn report_key_order_matches_spec() {
        let report = Report {
            tables: BTreeSet::new(),
            variables: BTreeMap::new(),
            values: BTreeMap::new(),
            temp_tables: BTreeSet::new(),
            ctes: BTreeSet::new(),
            functions: Vec::new(),
            created_objects: BTreeSet::new(),
            write_targets: BTreeSet::new(),
            pseudocode: BTreeMap::new(),
            warnings: Vec::new(),
            meta: Meta {
                statements: 0,
                dialect: "teradata".to_string(),
            },
        };
        let json = serde_json::to_string(&report).unwrap();
        let keys = [
            "_tables",
            "_variables",
            "_values",
            "_temp_tables",
            "_ctes",
            "_functions",
            "_created_objects",
            "_write_targets",
            "_pseudocode",
            "_warnings",
            "_meta",
        ];
        let mut last = 0;
        for key in keys {
            let pos = json.find(&format!("\"{key}\"")).unwrap();
            assert!(pos >= last, "{key} out of order");
            last = pos;
        }
    }
}
