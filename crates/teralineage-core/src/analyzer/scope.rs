//! Scope resolution: for one SELECT's `FROM` clause, maps aliases (and, for derived
//! tables and CTE references with a traceable single source, column ownership) to base
//! tables, so that column references elsewhere in the same SELECT can be attributed.

use crate::types::QualifiedName;
use std::collections::HashMap;

/// The resolved alias map for a single SELECT's `FROM` clause, plus — when the clause
/// has exactly one attributable source — the base table unqualified columns belong to.
#[derive(Debug, Default, Clone)]
pub(crate) struct Scope {
    /// Normalized alias/table-name -> the base table it resolves to. Populated for
    /// plain table references and, by pass-through, for derived tables/CTE references
    /// whose own body resolves to exactly one base table.
    sources: HashMap<String, QualifiedName>,
    /// Set when the `FROM` clause contributes exactly one attributable source overall;
    /// unqualified column references in this SELECT attribute to it.
    pub(crate) single_base: Option<QualifiedName>,
    /// Count of FROM/JOIN items seen, independent of the alias map's key count (a
    /// table reference registers two keys — alias and base name). Self-joins and
    /// unresolvable items (an unsupported table factor, a CTE with no traceable
    /// single base) count here too, since either makes an unqualified reference
    /// ambiguous even when the alias map itself ends up with one or zero entries.
    item_count: usize,
    last_base: Option<QualifiedName>,
    /// Per-alias output-column maps for derived tables and CTE references: the
    /// qualifier's normalized output-column name -> the real `(base table, column)`
    /// it traces to inside that subquery's own projection. Lets a reference like
    /// `a.cust_id` through `(SELECT customer_id AS cust_id FROM t) a` attribute to
    /// `t.customer_id` rather than the synthetic outer name.
    column_maps: HashMap<String, HashMap<String, (QualifiedName, String)>>,
    /// This SELECT's own projected output columns, keyed by output name — filled in
    /// once its projection has been attributed, so a parent query wrapping this one
    /// as a derived table or CTE can register it via [`Scope::add_column_map`].
    pub(crate) projected_columns: HashMap<String, (QualifiedName, String)>,
}

impl Scope {
    pub(crate) fn insert_source(&mut self, alias: &str, base: QualifiedName) {
        self.sources.insert(alias.to_lowercase(), base);
    }

    /// Registers one resolved FROM/JOIN item under both its alias (or base name, if
    /// unaliased) and its base name, counting it toward `single_base` eligibility.
    pub(crate) fn add_table_item(&mut self, alias: Option<&str>, base: QualifiedName) {
        self.item_count += 1;
        let key = alias.unwrap_or(base.base.as_str()).to_string();
        self.insert_source(&key, base.clone());
        self.insert_source(&base.base, base.clone());
        self.last_base = Some(base);
    }

    /// Registers one FROM/JOIN item that could not be resolved to a single base table
    /// (an unsupported table factor shape, or a CTE/derived table whose own body does
    /// not trace to exactly one base) — still counts toward `single_base` eligibility.
    pub(crate) fn add_unresolved_item(&mut self) {
        self.item_count += 1;
    }

    /// Finalizes `single_base`: set only when the clause contributed exactly one item
    /// and that item resolved.
    pub(crate) fn finalize(&mut self) {
        self.single_base = if self.item_count == 1 {
            self.last_base.clone()
        } else {
            None
        };
    }

    pub(crate) fn lookup(&self, alias: &str) -> Option<&QualifiedName> {
        self.sources.get(&alias.to_lowercase())
    }

    /// Registers a derived table's or CTE's traced output-column map under its
    /// qualifier key, so `qualifier.output_name` resolves to the real source column.
    pub(crate) fn add_column_map(&mut self, alias: &str, columns: HashMap<String, (QualifiedName, String)>) {
        self.column_maps.insert(alias.to_lowercase(), columns);
    }

    /// Every distinct base table reachable from this scope's sources, sorted for
    /// deterministic warning emission order.
    pub(crate) fn distinct_sources(&self) -> Vec<QualifiedName> {
        let set: std::collections::BTreeSet<QualifiedName> = self.sources.values().cloned().collect();
        set.into_iter().collect()
    }

    /// Resolves a (possibly unqualified) column reference against this scope, then
    /// against each ancestor scope in turn — the correlated-subquery case, where an
    /// inner SELECT references a column owned by an enclosing SELECT's FROM clause.
    pub(crate) fn resolve(&self, qualifier: Option<&str>, ancestors: &ResolvedScopes) -> Option<QualifiedName> {
        if let Some(q) = qualifier {
            if let Some(base) = self.lookup(q) {
                return Some(base.clone());
            }
            return ancestors.0.iter().rev().find_map(|s| s.lookup(q).cloned());
        }
        self.single_base
            .clone()
            .or_else(|| ancestors.0.iter().rev().find_map(|s| s.single_base.clone()))
    }

    /// Resolves a column reference to its real `(base table, column)`, translating
    /// through a derived table's or CTE's output-column map when the qualifier names
    /// one — so `a.cust_id` against `(SELECT customer_id AS cust_id FROM t) a` traces to
    /// `t.customer_id` rather than recording `a`/`cust_id` verbatim.
    pub(crate) fn resolve_column(
        &self,
        qualifier: Option<&str>,
        column: &str,
        ancestors: &ResolvedScopes,
    ) -> Option<(QualifiedName, String)> {
        if let Some(q) = qualifier {
            let qk = q.to_lowercase();
            let ck = column.to_lowercase();
            if let Some(pair) = self.column_maps.get(&qk).and_then(|map| map.get(&ck)) {
                return Some(pair.clone());
            }
            if let Some(base) = self.lookup(q) {
                return Some((base.clone(), column.to_string()));
            }
            for s in ancestors.0.iter().rev() {
                if let Some(pair) = s.column_maps.get(&qk).and_then(|map| map.get(&ck)) {
                    return Some(pair.clone());
                }
                if let Some(base) = s.lookup(q) {
                    return Some((base.clone(), column.to_string()));
                }
            }
            return None;
        }
        if let Some(base) = &self.single_base {
            return Some((base.clone(), column.to_string()));
        }
        ancestors
            .0
            .iter()
            .rev()
            .find_map(|s| s.single_base.clone())
            .map(|b| (b, column.to_string()))
    }
}

/// The chain of enclosing scopes, outermost first, used to resolve correlated column
/// references from within a nested SELECT.
#[derive(Debug, Default, Clone)]
pub(crate) struct ResolvedScopes(pub(crate) Vec<Scope>);

impl ResolvedScopes {
    pub(crate) fn child(&self, scope: &Scope) -> Self {
        let mut chain = self.0.clone();
        chain.push(scope.clone());
        Self(chain)
    }
}
