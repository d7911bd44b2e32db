//! Structural diff between snapshots.
//!
//! [`diff`] compares two snapshots and emits the minimal patch list that
//! turns the first into the second: container-kind changes and leaf changes
//! become whole-value replaces, object entries are added, replaced, or
//! removed key by key, and sequences are compared element by element with
//! growth expressed as tail adds and shrinkage as a single `length` replace.
//! Branches that share storage are skipped without descending.

use std::sync::Arc;

use crate::constants::LENGTH_KEY;

use super::patch::Patch;
use super::path::PathStep;
use super::value::Value;

/// Computes the patches that transform `old` into `new`.
///
/// Two equal snapshots produce an empty list.
pub fn diff(old: &Value, new: &Value) -> Vec<Patch> {
    let mut patches = Vec::new();
    diff_at(&mut Vec::new(), old, new, &mut patches);
    patches
}

/// Clones `old`, runs `mutate` on the clone, and returns the mutated
/// snapshot together with the patches describing the edit.
pub fn diff_with<F>(old: &Value, mutate: F) -> (Value, Vec<Patch>)
where
    F: FnOnce(&mut Value),
{
    let mut draft = old.clone();
    mutate(&mut draft);
    let patches = diff(old, &draft);
    (draft, patches)
}

fn diff_at(path: &mut Vec<PathStep>, old: &Value, new: &Value, out: &mut Vec<Patch>) {
    match (old, new) {
        (Value::Map(old_entries), Value::Map(new_entries)) => {
            if Arc::ptr_eq(old_entries, new_entries) {
                return;
            }
            for key in old_entries.keys() {
                if !new_entries.contains_key(key) {
                    path.push(PathStep::Key(key.clone()));
                    out.push(Patch::remove(path.clone()));
                    path.pop();
                }
            }
            for (key, new_value) in new_entries.iter() {
                path.push(PathStep::Key(key.clone()));
                match old_entries.get(key) {
                    None => out.push(Patch::add(path.clone(), new_value.clone())),
                    Some(old_value) => diff_at(path, old_value, new_value, out),
                }
                path.pop();
            }
        }
        (Value::List(old_items), Value::List(new_items)) => {
            if Arc::ptr_eq(old_items, new_items) {
                return;
            }
            let shared = old_items.len().min(new_items.len());
            for index in 0..shared {
                path.push(PathStep::Index(index));
                diff_at(path, &old_items[index], &new_items[index], out);
                path.pop();
            }
            for (index, item) in new_items.iter().enumerate().skip(shared) {
                path.push(PathStep::Index(index));
                out.push(Patch::add(path.clone(), item.clone()));
                path.pop();
            }
            if new_items.len() < old_items.len() {
                path.push(PathStep::Key(LENGTH_KEY.to_string()));
                out.push(Patch::replace(path.clone(), new_items.len() as f64));
                path.pop();
            }
        }
        _ => {
            if old != new {
                out.push(Patch::replace(path.clone(), new.clone()));
            }
        }
    }
}
