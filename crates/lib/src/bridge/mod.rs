//! Bidirectional conversion between snapshot values and shared types.
//!
//! Writing: objects become shared maps, arrays become shared sequences,
//! strings on text-backed paths become shared text, and everything else is
//! stored as a plain leaf. Reading walks a shared tree back into a plain
//! [`Value`], with shared text surfacing as an ordinary string.
//!
//! Only map, sequence, and text shared types can appear in a document this
//! crate manages; anything else surfaces as a [`BridgeError`].

use std::collections::BTreeMap;
use std::sync::Arc;

use yrs::{
    Any, Array, ArrayPrelim, ArrayRef, GetString, Map, MapPrelim, MapRef, Out, ReadTxn,
    TextPrelim, TextRef, TransactionMut,
};

use crate::snapshot::{PathStep, TextPathSet, Value};

pub mod errors;
pub use errors::BridgeError;

/// A shared container this crate knows how to manage.
#[derive(Debug, Clone)]
pub enum SharedNode {
    Map(MapRef),
    Sequence(ArrayRef),
    Text(TextRef),
}

impl SharedNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SharedNode::Map(_) => "map",
            SharedNode::Sequence(_) => "sequence",
            SharedNode::Text(_) => "text",
        }
    }
}

impl TryFrom<Out> for SharedNode {
    type Error = BridgeError;

    fn try_from(out: Out) -> Result<Self, BridgeError> {
        match out {
            Out::YMap(map) => Ok(SharedNode::Map(map)),
            Out::YArray(sequence) => Ok(SharedNode::Sequence(sequence)),
            Out::YText(text) => Ok(SharedNode::Text(text)),
            other => Err(BridgeError::UnsupportedSharedType {
                kind: out_kind_name(&other).to_string(),
            }),
        }
    }
}

/// The engine-side kind of an output value, for error messages.
pub(crate) fn out_kind_name(out: &Out) -> &'static str {
    match out {
        Out::Any(_) => "leaf",
        Out::YMap(_) => "map",
        Out::YArray(_) => "sequence",
        Out::YText(_) => "text",
        Out::YDoc(_) => "subdocument",
        _ => "xml",
    }
}

/// Writes `value` under `key` in a shared map.
///
/// `path` must address the entry being written (its last step is `key`);
/// it decides which strings become shared text.
pub fn write_map_entry(
    txn: &mut TransactionMut,
    map: &MapRef,
    key: &str,
    value: &Value,
    path: &mut Vec<PathStep>,
    text_paths: &TextPathSet,
) {
    match value {
        Value::Map(entries) => {
            let nested = map.insert(txn, key, MapPrelim::default());
            fill_map(txn, &nested, entries, path, text_paths);
        }
        Value::List(items) => {
            let nested = map.insert(txn, key, ArrayPrelim::default());
            fill_sequence(txn, &nested, items, path, text_paths);
        }
        Value::String(content) if text_paths.matches(path) => {
            map.insert(txn, key, TextPrelim::new(content.clone()));
        }
        leaf => {
            map.insert(txn, key, plain_any(leaf));
        }
    }
}

/// Writes `value` at `index` in a shared sequence, shifting later items.
///
/// `path` must address the entry being written (its last step is the index).
pub fn write_sequence_entry(
    txn: &mut TransactionMut,
    sequence: &ArrayRef,
    index: u32,
    value: &Value,
    path: &mut Vec<PathStep>,
    text_paths: &TextPathSet,
) {
    match value {
        Value::Map(entries) => {
            let nested = sequence.insert(txn, index, MapPrelim::default());
            fill_map(txn, &nested, entries, path, text_paths);
        }
        Value::List(items) => {
            let nested = sequence.insert(txn, index, ArrayPrelim::default());
            fill_sequence(txn, &nested, items, path, text_paths);
        }
        Value::String(content) if text_paths.matches(path) => {
            sequence.insert(txn, index, TextPrelim::new(content.clone()));
        }
        leaf => {
            sequence.insert(txn, index, plain_any(leaf));
        }
    }
}

fn fill_map(
    txn: &mut TransactionMut,
    map: &MapRef,
    entries: &BTreeMap<String, Value>,
    path: &mut Vec<PathStep>,
    text_paths: &TextPathSet,
) {
    for (key, value) in entries {
        path.push(PathStep::Key(key.clone()));
        write_map_entry(txn, map, key, value, path, text_paths);
        path.pop();
    }
}

fn fill_sequence(
    txn: &mut TransactionMut,
    sequence: &ArrayRef,
    items: &[Value],
    path: &mut Vec<PathStep>,
    text_paths: &TextPathSet,
) {
    for (index, item) in items.iter().enumerate() {
        path.push(PathStep::Index(index));
        write_sequence_entry(txn, sequence, index as u32, item, path, text_paths);
        path.pop();
    }
}

/// The plain-leaf rendition of a value. Containers nest as plain
/// aggregates; in a managed document this is only reached for leaves.
pub fn plain_any(value: &Value) -> Any {
    match value {
        Value::Null => Any::Null,
        Value::Undefined => Any::Undefined,
        Value::Bool(value) => Any::Bool(*value),
        Value::Number(value) => Any::Number(*value),
        Value::BigInt(value) => Any::BigInt(*value),
        Value::String(value) => Any::String(value.as_str().into()),
        Value::List(items) => Any::Array(items.iter().map(plain_any).collect()),
        Value::Map(entries) => Any::Map(Arc::new(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), plain_any(value)))
                .collect(),
        )),
    }
}

/// Reads an engine output value back into a snapshot value.
pub fn read_out<T: ReadTxn>(txn: &T, out: &Out) -> Result<Value, BridgeError> {
    match out {
        Out::Any(any) => read_any(any),
        Out::YText(text) => Ok(Value::String(text.get_string(txn))),
        Out::YMap(map) => read_map(txn, map),
        Out::YArray(sequence) => read_sequence(txn, sequence),
        other => Err(BridgeError::UnsupportedSharedType {
            kind: out_kind_name(other).to_string(),
        }),
    }
}

/// Reads a whole shared map into a snapshot value.
pub fn read_map<T: ReadTxn>(txn: &T, map: &MapRef) -> Result<Value, BridgeError> {
    let mut entries = BTreeMap::new();
    for (key, value) in map.iter(txn) {
        entries.insert(key.to_string(), read_out(txn, &value)?);
    }
    Ok(Value::Map(Arc::new(entries)))
}

fn read_sequence<T: ReadTxn>(txn: &T, sequence: &ArrayRef) -> Result<Value, BridgeError> {
    let mut items = Vec::with_capacity(sequence.len(txn) as usize);
    for value in sequence.iter(txn) {
        items.push(read_out(txn, &value)?);
    }
    Ok(Value::List(Arc::new(items)))
}

fn read_any(any: &Any) -> Result<Value, BridgeError> {
    match any {
        Any::Null => Ok(Value::Null),
        Any::Undefined => Ok(Value::Undefined),
        Any::Bool(value) => Ok(Value::Bool(*value)),
        Any::Number(value) => Ok(Value::Number(*value)),
        Any::BigInt(value) => Ok(Value::BigInt(*value)),
        Any::String(value) => Ok(Value::String(value.to_string())),
        Any::Array(items) => {
            let items = items
                .iter()
                .map(read_any)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(Arc::new(items)))
        }
        Any::Map(entries) => {
            let mut plain = BTreeMap::new();
            for (key, value) in entries.iter() {
                plain.insert(key.clone(), read_any(value)?);
            }
            Ok(Value::Map(Arc::new(plain)))
        }
        _ => Err(BridgeError::UnsupportedContent {
            kind: "binary buffer".to_string(),
        }),
    }
}
