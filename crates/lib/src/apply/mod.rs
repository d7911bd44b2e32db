//! Applies path-addressed patches to the live shared tree.
//!
//! Each patch is routed by walking its path from the root map to the
//! parent container of the target, then dispatched on the parent's kind
//! and the terminal step. A string landing on a map key that already
//! holds shared text is narrowed to character-level edits instead of
//! replacing it; sequence elements are replaced whole, and the reserved
//! `length` key on sequences truncates.

use tracing::trace;
use yrs::{Array, ArrayRef, GetString, Map, MapRef, Out, TextRef, TransactionMut};

use crate::bridge::{self, SharedNode, out_kind_name};
use crate::constants::LENGTH_KEY;
use crate::snapshot::{Patch, PatchOp, PathStep, TextPathSet, Value, render_path};
use crate::text::{edit_script, patch_text};

pub mod errors;
pub use errors::ApplyError;

/// Applies one patch inside an open transaction.
///
/// On error the transaction keeps everything applied so far; the caller
/// decides whether to roll the document back.
pub fn apply_patch(
    txn: &mut TransactionMut,
    root: &MapRef,
    patch: &Patch,
    text_paths: &TextPathSet,
) -> Result<(), ApplyError> {
    trace!(%patch, "applying patch");
    let Some((terminal, _)) = patch.path.split_last() else {
        return replace_root(txn, root, patch, text_paths);
    };
    match walk_to_parent(txn, root, &patch.path)? {
        SharedNode::Map(map) => apply_in_map(txn, &map, terminal, patch, text_paths),
        SharedNode::Sequence(sequence) => {
            apply_in_sequence(txn, &sequence, terminal, patch, text_paths)
        }
        SharedNode::Text(text) => apply_to_text(txn, &text, patch),
    }
}

/// Resolves the parent container of a non-root patch path.
fn walk_to_parent(
    txn: &TransactionMut,
    root: &MapRef,
    path: &[PathStep],
) -> Result<SharedNode, ApplyError> {
    let route = &path[..path.len() - 1];
    let mut node = SharedNode::Map(root.clone());
    for (depth, step) in route.iter().enumerate() {
        let out = match (&node, step) {
            (SharedNode::Map(map), PathStep::Key(key)) => map.get(txn, key),
            (SharedNode::Sequence(sequence), PathStep::Index(index)) => {
                sequence.get(txn, *index as u32)
            }
            _ => {
                return Err(ApplyError::NotTraversable {
                    path: render_path(&path[..=depth]),
                    kind: node.kind_name().to_string(),
                });
            }
        };
        let out = out.ok_or_else(|| ApplyError::PathNotFound {
            path: render_path(&path[..=depth]),
        })?;
        let kind = out_kind_name(&out);
        node = SharedNode::try_from(out).map_err(|_| ApplyError::NotTraversable {
            path: render_path(&path[..=depth]),
            kind: kind.to_string(),
        })?;
    }
    Ok(node)
}

fn apply_in_map(
    txn: &mut TransactionMut,
    map: &MapRef,
    terminal: &PathStep,
    patch: &Patch,
    text_paths: &TextPathSet,
) -> Result<(), ApplyError> {
    let PathStep::Key(key) = terminal else {
        return Err(structural(patch, "map"));
    };
    match &patch.op {
        PatchOp::Add(value) | PatchOp::Replace(value) => {
            // A string landing on existing shared text becomes an in-place edit
            if let Some(Out::YText(text)) = map.get(&*txn, key)
                && let Value::String(new_content) = value
            {
                let current = text.get_string(&*txn);
                patch_text(txn, &text, &edit_script(&current, new_content));
                return Ok(());
            }
            let mut path = patch.path.clone();
            bridge::write_map_entry(txn, map, key, value, &mut path, text_paths);
            Ok(())
        }
        PatchOp::Remove => {
            map.remove(txn, key);
            Ok(())
        }
    }
}

fn apply_in_sequence(
    txn: &mut TransactionMut,
    sequence: &ArrayRef,
    terminal: &PathStep,
    patch: &Patch,
    text_paths: &TextPathSet,
) -> Result<(), ApplyError> {
    match terminal {
        PathStep::Index(index) => {
            let index = *index;
            let len = sequence.len(&*txn) as usize;
            match &patch.op {
                PatchOp::Add(value) => {
                    if index > len {
                        return Err(out_of_bounds(patch, index, len));
                    }
                    let mut path = patch.path.clone();
                    bridge::write_sequence_entry(
                        txn,
                        sequence,
                        index as u32,
                        value,
                        &mut path,
                        text_paths,
                    );
                    Ok(())
                }
                PatchOp::Replace(value) => {
                    if index >= len {
                        return Err(out_of_bounds(patch, index, len));
                    }
                    // Sequences are insert/delete only; a replaced element is
                    // rebuilt even when it holds shared text
                    sequence.remove(txn, index as u32);
                    let mut path = patch.path.clone();
                    bridge::write_sequence_entry(
                        txn,
                        sequence,
                        index as u32,
                        value,
                        &mut path,
                        text_paths,
                    );
                    Ok(())
                }
                PatchOp::Remove => {
                    if index >= len {
                        return Err(out_of_bounds(patch, index, len));
                    }
                    sequence.remove(txn, index as u32);
                    Ok(())
                }
            }
        }
        PathStep::Key(key) if key == LENGTH_KEY => {
            let PatchOp::Replace(value) = &patch.op else {
                return Err(structural(patch, "sequence"));
            };
            let Some(new_len) = value_as_length(value) else {
                return Err(structural(patch, "sequence"));
            };
            // Only truncation; sequences grow through explicit adds
            let len = sequence.len(&*txn) as usize;
            if new_len < len {
                sequence.remove_range(txn, new_len as u32, (len - new_len) as u32);
            }
            Ok(())
        }
        PathStep::Key(_) => Err(structural(patch, "sequence")),
    }
}

fn apply_to_text(
    txn: &mut TransactionMut,
    text: &TextRef,
    patch: &Patch,
) -> Result<(), ApplyError> {
    let Some(Value::String(new_content)) = patch.value() else {
        return Err(structural(patch, "text"));
    };
    let current = text.get_string(&*txn);
    patch_text(txn, text, &edit_script(&current, new_content));
    Ok(())
}

fn replace_root(
    txn: &mut TransactionMut,
    root: &MapRef,
    patch: &Patch,
    text_paths: &TextPathSet,
) -> Result<(), ApplyError> {
    let PatchOp::Replace(value) = &patch.op else {
        return Err(ApplyError::RootRequiresReplace {
            op: patch.op_name().to_string(),
        });
    };
    let Some(entries) = value.as_map() else {
        return Err(ApplyError::RootNotObject {
            found: value.type_name().to_string(),
        });
    };
    let existing: Vec<String> = root.keys(&*txn).map(|key| key.to_string()).collect();
    for key in existing {
        root.remove(txn, &key);
    }
    let mut path = Vec::new();
    for (key, item) in entries {
        path.push(PathStep::Key(key.clone()));
        bridge::write_map_entry(txn, root, key, item, &mut path, text_paths);
        path.pop();
    }
    Ok(())
}

fn value_as_length(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
        Value::BigInt(i) if *i >= 0 => Some(*i as usize),
        _ => None,
    }
}

fn structural(patch: &Patch, parent_kind: &str) -> ApplyError {
    ApplyError::StructuralViolation {
        patch: patch.to_string(),
        parent_kind: parent_kind.to_string(),
    }
}

fn out_of_bounds(patch: &Patch, index: usize, len: usize) -> ApplyError {
    ApplyError::IndexOutOfBounds {
        path: render_path(&patch.path),
        index,
        len,
    }
}
