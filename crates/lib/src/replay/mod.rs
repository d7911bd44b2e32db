//! Replays engine change events against an immutable snapshot.
//!
//! Incoming deltas mutate the shared tree directly; the plain snapshot
//! follows by replaying the change events the engine reports. Replay is
//! pure: it takes the previous snapshot and a captured event batch and
//! produces the next snapshot, sharing every untouched branch with the
//! previous one.

use crate::snapshot::{PathStep, Value, render_path};
use crate::text::{EditOp, patch_string};

pub mod capture;
pub mod errors;

pub use capture::capture_events;
pub use errors::ReplayError;

/// One container's worth of change, addressed by path from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Path of the changed container. Empty means the root map.
    pub path: Vec<PathStep>,
    pub change: ContainerChange,
}

/// What changed inside a container.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerChange {
    /// Key-level changes on a map, sorted by key.
    Map(Vec<(String, EntryAction)>),
    /// A cursor-relative delta over a sequence.
    Sequence(Vec<SequenceDelta>),
    /// A cursor-relative edit script over shared text.
    Text(Vec<EditOp>),
}

/// A single map key change.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryAction {
    /// The key now holds this value (covers both insert and overwrite).
    Put(Value),
    Remove,
}

/// One operation of a sequence delta.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceDelta {
    /// Keep the next `n` items, advancing the cursor.
    Retain(usize),
    /// Insert items at the cursor, advancing past them.
    Insert(Vec<Value>),
    /// Delete the next `n` items at the cursor.
    Delete(usize),
}

/// Replays an event batch, returning the next snapshot.
///
/// The input snapshot is untouched; the result shares every branch the
/// events did not reach.
pub fn replay_events(snapshot: &Value, events: &[ChangeEvent]) -> Result<Value, ReplayError> {
    let mut next = snapshot.clone();
    for event in events {
        apply_event(&mut next, event)?;
    }
    Ok(next)
}

fn apply_event(snapshot: &mut Value, event: &ChangeEvent) -> Result<(), ReplayError> {
    let target = snapshot
        .get_path_mut(&event.path)
        .ok_or_else(|| ReplayError::UnknownContainer {
            path: render_path(&event.path),
        })?;
    let found = target.type_name();
    match &event.change {
        ContainerChange::Map(changes) => {
            let Some(entries) = target.as_map_mut() else {
                return Err(mismatch(&event.path, "object", found));
            };
            for (key, action) in changes {
                match action {
                    EntryAction::Put(value) => {
                        entries.insert(key.clone(), value.clone());
                    }
                    EntryAction::Remove => {
                        entries.remove(key);
                    }
                }
            }
        }
        ContainerChange::Sequence(deltas) => {
            let Some(items) = target.as_list_mut() else {
                return Err(mismatch(&event.path, "array", found));
            };
            let mut cursor = 0usize;
            for delta in deltas {
                match delta {
                    SequenceDelta::Retain(n) => {
                        cursor += n;
                        if cursor > items.len() {
                            return Err(delta_overrun(&event.path, "retain", items.len()));
                        }
                    }
                    SequenceDelta::Delete(n) => {
                        if cursor + n > items.len() {
                            return Err(delta_overrun(&event.path, "delete", items.len()));
                        }
                        items.drain(cursor..cursor + n);
                    }
                    SequenceDelta::Insert(values) => {
                        items.splice(cursor..cursor, values.iter().cloned());
                        cursor += values.len();
                    }
                }
            }
        }
        ContainerChange::Text(script) => {
            let Value::String(current) = target else {
                return Err(mismatch(&event.path, "string", found));
            };
            let next =
                patch_string(current, script).ok_or_else(|| ReplayError::MalformedDelta {
                    path: render_path(&event.path),
                    reason: "edit script does not fit current content".to_string(),
                })?;
            *current = next;
        }
    }
    Ok(())
}

fn mismatch(path: &[PathStep], expected: &str, found: &str) -> ReplayError {
    ReplayError::ContainerMismatch {
        path: render_path(path),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn delta_overrun(path: &[PathStep], op: &str, len: usize) -> ReplayError {
    ReplayError::MalformedDelta {
        path: render_path(path),
        reason: format!("{op} past the end of a {len}-item sequence"),
    }
}
