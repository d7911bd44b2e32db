//! Plain snapshot values.
//!
//! [`Value`] is the application-facing rendition of a document: an immutable
//! JSON-like tree with persistent structural sharing. Containers are wrapped in
//! [`Arc`], so cloning a snapshot is cheap and two snapshots that differ in one
//! branch still share every untouched subtree. Mutation goes through
//! copy-on-write helpers that split shared nodes only along the edited path.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::path::PathStep;

/// A plain value in a document snapshot.
///
/// Leaves mirror the primitive kinds a schema may declare; containers hold
/// nested values behind shared pointers. The distinction between [`Number`]
/// (double precision) and [`BigInt`] (exact 64-bit integer) is preserved
/// end to end, through the live document and back.
///
/// [`Number`]: Value::Number
/// [`BigInt`]: Value::BigInt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The explicit null leaf.
    Null,
    /// The absent-value leaf. Serializes as `null`; JSON cannot round-trip it.
    Undefined,
    /// Boolean leaf.
    Bool(bool),
    /// Double-precision number leaf.
    Number(f64),
    /// Exact 64-bit integer leaf.
    BigInt(i64),
    /// String leaf.
    String(String),
    /// Ordered sequence of values.
    List(Arc<Vec<Value>>),
    /// String-keyed mapping with deterministic iteration order.
    Map(Arc<BTreeMap<String, Value>>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    /// Creates an empty map value.
    pub fn empty_map() -> Self {
        Value::Map(Arc::new(BTreeMap::new()))
    }

    /// Creates an empty list value.
    pub fn empty_list() -> Self {
        Value::List(Arc::new(Vec::new()))
    }

    /// The kind of this value, in schema vocabulary.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::List(_) => "array",
            Value::Map(_) => "object",
        }
    }

    /// Returns true for the leaf kinds (everything except lists and maps).
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::BigInt(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Mutable access to list items, splitting shared storage if needed.
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(items) => Some(Arc::make_mut(items)),
            _ => None,
        }
    }

    /// Mutable access to map entries, splitting shared storage if needed.
    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(Arc::make_mut(entries)),
            _ => None,
        }
    }

    /// Gets a map entry by key. Returns `None` on non-maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(key)
    }

    /// Mutable map entry lookup with copy-on-write.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.as_map_mut()?.get_mut(key)
    }

    /// Sets a map entry, returning the previous value if any.
    /// No-op (returning `None`) when this value is not a map.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.as_map_mut()?.insert(key.into(), value.into())
    }

    /// Removes a map entry, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.as_map_mut()?.remove(key)
    }

    /// Gets a list item by position. Returns `None` on non-lists.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_list()?.get(index)
    }

    /// Mutable list item lookup with copy-on-write.
    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.as_list_mut()?.get_mut(index)
    }

    /// Appends to a list. No-op when this value is not a list.
    pub fn push(&mut self, value: impl Into<Value>) {
        if let Some(items) = self.as_list_mut() {
            items.push(value.into());
        }
    }

    /// Inserts into a list at `index`, shifting later items.
    /// No-op when this value is not a list or `index` is out of bounds.
    pub fn insert_at(&mut self, index: usize, value: impl Into<Value>) {
        if let Some(items) = self.as_list_mut()
            && index <= items.len()
        {
            items.insert(index, value.into());
        }
    }

    /// Removes a list item by position, returning it if in bounds.
    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        let items = self.as_list_mut()?;
        if index < items.len() {
            Some(items.remove(index))
        } else {
            None
        }
    }

    /// Shortens a list to `len` items. No-op on non-lists or when already shorter.
    pub fn truncate(&mut self, len: usize) {
        if let Some(items) = self.as_list_mut() {
            items.truncate(len);
        }
    }

    /// Follows a path of keys and indices down the tree.
    pub fn get_path(&self, path: &[PathStep]) -> Option<&Value> {
        let mut node = self;
        for step in path {
            node = match step {
                PathStep::Key(key) => node.get(key)?,
                PathStep::Index(index) => node.get_index(*index)?,
            };
        }
        Some(node)
    }

    /// Mutable path descent, splitting shared nodes along the way.
    pub fn get_path_mut(&mut self, path: &[PathStep]) -> Option<&mut Value> {
        let mut node = self;
        for step in path {
            node = match step {
                PathStep::Key(key) => node.get_mut(key)?,
                PathStep::Index(index) => node.get_index_mut(*index)?,
            };
        }
        Some(node)
    }
}

// From implementations for leaf types

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::BigInt(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(Arc::new(entries))
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(*value),
            serde_json::Value::Number(number) => from_json_number(number),
            serde_json::Value::String(value) => Value::String(value.clone()),
            serde_json::Value::Array(items) => {
                Value::List(Arc::new(items.iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(entries) => Value::Map(Arc::new(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect(),
            )),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from(&json)
    }
}

/// JSON integers stay doubles as long as the double is exact, matching how
/// they behave in the snapshot's number model. Anything past 2^53 keeps its
/// integer identity as a bigint.
fn from_json_number(number: &serde_json::Number) -> Value {
    if let Some(int) = number.as_i64() {
        let double = int as f64;
        if double as i64 == int {
            Value::Number(double)
        } else {
            Value::BigInt(int)
        }
    } else if let Some(double) = number.as_f64() {
        Value::Number(double)
    } else {
        // u64 beyond i64 range
        Value::Number(number.as_u64().map(|u| u as f64).unwrap_or(0.0))
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            // JSON has no undefined; both absent kinds render as null
            Value::Null | Value::Undefined => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Number(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::BigInt(value) => serde_json::Value::Number((*value).into()),
            Value::String(value) => serde_json::Value::String(value.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        serde_json::Value::from(&value)
    }
}

// Comparison conveniences for tests and call sites

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<String> for Value {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == Some(other.as_str())
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<Value> for &str {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}

impl PartialEq<Value> for String {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            other => write!(f, "{}", serde_json::Value::from(other)),
        }
    }
}
