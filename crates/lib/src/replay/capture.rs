//! Converts engine deep-observer events into owned change events.
//!
//! Capture runs inside the observer callback, while the transaction that
//! produced the events is still open. Everything is copied out into plain
//! values so replay can happen after the transaction has committed.

use tracing::trace;
use yrs::TransactionMut;
use yrs::types::{Change, Delta, EntryChange, Event, Events, Path, PathSegment};

use crate::bridge::read_out;
use crate::snapshot::{PathStep, Value, render_path};
use crate::text::EditOp;

use super::errors::ReplayError;
use super::{ChangeEvent, ContainerChange, EntryAction, SequenceDelta};

/// Captures every event of a deep-observer batch.
pub fn capture_events(
    txn: &TransactionMut,
    events: &Events,
) -> Result<Vec<ChangeEvent>, ReplayError> {
    let mut captured = Vec::new();
    for event in events.iter() {
        let event = capture_event(txn, event)?;
        trace!(path = %render_path(&event.path), "captured change event");
        captured.push(event);
    }
    Ok(captured)
}

fn capture_event(txn: &TransactionMut, event: &Event) -> Result<ChangeEvent, ReplayError> {
    match event {
        Event::Map(event) => {
            let mut changes = Vec::new();
            for (key, change) in event.keys(txn).iter() {
                let action = match change {
                    EntryChange::Inserted(value) | EntryChange::Updated(_, value) => {
                        EntryAction::Put(read_out(txn, value)?)
                    }
                    EntryChange::Removed(_) => EntryAction::Remove,
                };
                changes.push((key.to_string(), action));
            }
            // key iteration order is not deterministic
            changes.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(ChangeEvent {
                path: convert_path(event.path()),
                change: ContainerChange::Map(changes),
            })
        }
        Event::Array(event) => {
            let mut deltas = Vec::new();
            for change in event.delta(txn) {
                deltas.push(match change {
                    Change::Added(values) => SequenceDelta::Insert(
                        values
                            .iter()
                            .map(|value| read_out(txn, value))
                            .collect::<Result<_, _>>()?,
                    ),
                    Change::Removed(len) => SequenceDelta::Delete(*len as usize),
                    Change::Retain(len) => SequenceDelta::Retain(*len as usize),
                });
            }
            Ok(ChangeEvent {
                path: convert_path(event.path()),
                change: ContainerChange::Sequence(deltas),
            })
        }
        Event::Text(event) => {
            let path = convert_path(event.path());
            let mut script = Vec::new();
            for delta in event.delta(txn) {
                script.push(match delta {
                    Delta::Inserted(chunk, _) => EditOp::Insert(inserted_chunk(txn, &path, chunk)?),
                    Delta::Deleted(len) => EditOp::Delete(*len as usize),
                    Delta::Retain(len, _) => EditOp::Retain(*len as usize),
                });
            }
            Ok(ChangeEvent {
                path,
                change: ContainerChange::Text(script),
            })
        }
        _ => Err(ReplayError::UnsupportedEvent {
            kind: "xml or subdocument".to_string(),
        }),
    }
}

fn inserted_chunk(
    txn: &TransactionMut,
    path: &[PathStep],
    chunk: &yrs::Out,
) -> Result<String, ReplayError> {
    match read_out(txn, chunk)? {
        Value::String(content) => Ok(content),
        other => Err(ReplayError::MalformedDelta {
            path: render_path(path),
            reason: format!("text insert carried {}", other.type_name()),
        }),
    }
}

fn convert_path(path: Path) -> Vec<PathStep> {
    path.into_iter()
        .map(|segment| match segment {
            PathSegment::Key(key) => PathStep::Key(key.to_string()),
            PathSegment::Index(index) => PathStep::Index(index as usize),
        })
        .collect()
}
