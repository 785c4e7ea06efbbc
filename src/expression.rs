//! Aliased Update Expressions
//!
//! A partial update names arbitrary operator-supplied fields, and a field
//! name is free to collide with a store reserved word. The builder
//! therefore never embeds a field name or value in the expression text:
//! each assignment gets a positional placeholder pair and the real names
//! and values travel in two side mappings, so the target store's native
//! parameterization mechanism can be substituted without changing the
//! planner's interface.

use std::collections::BTreeMap;

use crate::value::Value;

/// A rendered `SET` expression plus its alias mappings
///
/// For assignments `[(qty, 9), (loc, "B2")]` the rendering is
/// `SET #n0 = :v0, #n1 = :v1` with `#n0 → qty`, `:v0 → 9`, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    /// Expression text containing only placeholders
    pub expression: String,
    /// Name placeholder → real field name
    pub names: BTreeMap<String, String>,
    /// Value placeholder → value
    pub values: BTreeMap<String, Value>,
    assignments: Vec<(String, Value)>,
}

impl UpdateExpression {
    /// Build a `SET` expression from an ordered assignment list
    ///
    /// The caller guarantees a non-empty list; the no-assignment case is a
    /// no-op decided before any expression is built.
    #[must_use]
    pub fn set(assignments: Vec<(String, Value)>) -> Self {
        debug_assert!(!assignments.is_empty(), "SET expression needs at least one assignment");

        let mut clauses = Vec::with_capacity(assignments.len());
        let mut names = BTreeMap::new();
        let mut values = BTreeMap::new();
        for (i, (field, value)) in assignments.iter().enumerate() {
            let name_alias = format!("#n{i}");
            let value_alias = format!(":v{i}");
            clauses.push(format!("{name_alias} = {value_alias}"));
            names.insert(name_alias, field.clone());
            values.insert(value_alias, value.clone());
        }

        Self { expression: format!("SET {}", clauses.join(", ")), names, values, assignments }
    }

    /// The raw `(field, value)` pairs, in input order
    ///
    /// Stores that apply assignments directly (rather than through a
    /// parameterized expression language) read these instead of resolving
    /// the aliases.
    #[must_use]
    pub fn assignments(&self) -> &[(String, Value)] {
        &self.assignments
    }
}
