//! Caller-supplied parameters for a single invocation.
//!
//! A [`ParamSet`] is an ordered mapping with unique keys. Each entry
//! remembers where the value came from: pagination needs to distinguish a
//! cursor the caller supplied (manual paging) from one the engine would
//! inject, and presence alone cannot tell those apart.

use serde_json::Value;

use crate::error::{CoreError, Result};

/// A single parameter value. Shapes mirror [`crate::ValueKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Num(f64),
    Bool(bool),
    List(Vec<String>),
    /// Ordered `key=value` pairs; later keys win on duplicates.
    Map(Vec<(String, String)>),
    Json(Value),
}

impl ParamValue {
    /// Render the value into its wire representation.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Str(s) => Value::String(s.clone()),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Num(n) => Value::from(*n),
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::List(items) => {
                Value::Array(items.iter().map(|s| Value::String(s.clone())).collect())
            }
            ParamValue::Map(pairs) => {
                let mut map = serde_json::Map::new();
                for (k, v) in pairs {
                    map.insert(k.clone(), Value::String(v.clone()));
                }
                Value::Object(map)
            }
            ParamValue::Json(v) => v.clone(),
        }
    }

    /// Compact single-line rendering for prompts and logs.
    pub fn display(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }
}

/// Where a parameter value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Bound explicitly by the caller.
    Caller,
    /// Set by the engine (defaults, cursor plumbing).
    Engine,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    value: ParamValue,
    provenance: Provenance,
}

/// Ordered parameter mapping with unique keys, created per invocation.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    entries: Vec<Entry>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a caller-supplied value. Binding the same name twice is a
    /// usage error.
    pub fn bind(&mut self, name: impl Into<String>, value: ParamValue) -> Result<()> {
        self.insert(name.into(), value, Provenance::Caller)
    }

    /// Bind an engine-supplied value (same uniqueness rules).
    pub fn bind_engine(&mut self, name: impl Into<String>, value: ParamValue) -> Result<()> {
        self.insert(name.into(), value, Provenance::Engine)
    }

    fn insert(&mut self, name: String, value: ParamValue, provenance: Provenance) -> Result<()> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(CoreError::Validation(format!(
                "parameter '{name}' bound more than once"
            )));
        }
        self.entries.push(Entry {
            name,
            value,
            provenance,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    /// True if the caller (not the engine) bound this parameter.
    pub fn is_caller_bound(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.name == name && e.provenance == Provenance::Caller)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
