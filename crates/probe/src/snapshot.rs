//! Sparse key/value output of a bench session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const START: &str = "start";
pub const ENDED: &str = "ended";
pub const TOOK: &str = "took";
pub const HIGH_RES: &str = "h_res";
pub const MEM_USAGE: &str = "mem_usage";
pub const MEM_PEAK: &str = "mem_peak";
pub const MODULES_TOTAL: &str = "included_files_total";
pub const MODULES_LIST: &str = "included_files_list";
pub const ADDED: &str = "added";

/// Whether a value counts as empty and is left out of sparse output.
///
/// Numbers are never empty, so a count of zero is still reported.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(_) => false,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Options for [`BenchSession::snapshot`](crate::BenchSession::snapshot).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Report the module list itself, not just its length
    pub include_module_list: bool,
    /// Prefix removed from each listed module
    pub strip_prefix: Option<String>,
    /// Render memory figures as readable sizes; `None` uses the session config
    pub readable_memory: Option<bool>,
}

impl SnapshotOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module_list(mut self, include: bool) -> Self {
        self.include_module_list = include;
        self
    }

    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    pub fn with_readable_memory(mut self, readable: bool) -> Self {
        self.readable_memory = Some(readable);
        self
    }
}

/// A sparse mapping; consumers must treat every key as optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the value is empty.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        if !is_empty_value(&value) {
            self.0.insert(key.to_string(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Shortcut for string entries.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}
