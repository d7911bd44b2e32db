//! Character-level edit scripts for text-backed strings.
//!
//! When a string field is declared text-backed, whole-value replacement
//! would destroy concurrent edits, so string changes are narrowed to an
//! edit script first: the longest common prefix and suffix are kept and
//! only the differing middle is deleted and reinserted. The same script
//! vocabulary also carries incoming text deltas back onto plain strings.
//!
//! All counts are UTF-8 byte offsets, matching the offset kind the
//! document uses for its text primitives.

use serde::{Deserialize, Serialize};
use yrs::{Text, TextRef, TransactionMut};

/// One cursor-relative operation of an edit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOp {
    /// Keep the next `n` bytes, advancing the cursor past them.
    Retain(usize),
    /// Delete the next `n` bytes at the cursor.
    Delete(usize),
    /// Insert a chunk at the cursor, advancing past it.
    Insert(String),
}

/// Computes the edit script that turns `old` into `new`.
///
/// The result is at most `[retain, delete, insert]` with empty operations
/// and the trailing retain omitted; equal strings produce an empty script.
pub fn edit_script(old: &str, new: &str) -> Vec<EditOp> {
    if old == new {
        return Vec::new();
    }
    let prefix = common_prefix(old, new);
    let suffix = common_suffix(&old[prefix..], &new[prefix..]);

    let mut script = Vec::with_capacity(3);
    if prefix > 0 {
        script.push(EditOp::Retain(prefix));
    }
    let deleted = old.len() - prefix - suffix;
    if deleted > 0 {
        script.push(EditOp::Delete(deleted));
    }
    let inserted = &new[prefix..new.len() - suffix];
    if !inserted.is_empty() {
        script.push(EditOp::Insert(inserted.to_string()));
    }
    script
}

/// Replays an edit script against a live text primitive.
///
/// Deletes do not advance the cursor; retains and inserts do.
pub fn patch_text(txn: &mut TransactionMut, text: &TextRef, script: &[EditOp]) {
    let mut cursor = 0u32;
    for op in script {
        match op {
            EditOp::Retain(n) => cursor += *n as u32,
            EditOp::Delete(n) => text.remove_range(txn, cursor, *n as u32),
            EditOp::Insert(chunk) => {
                text.insert(txn, cursor, chunk);
                cursor += chunk.len() as u32;
            }
        }
    }
}

/// Replays an edit script against a plain string.
///
/// Returns `None` when the script runs past the end of `old` or splits a
/// character, which means it was computed against different content.
pub fn patch_string(old: &str, script: &[EditOp]) -> Option<String> {
    let mut out = String::with_capacity(old.len());
    let mut rest = old;
    for op in script {
        match op {
            EditOp::Retain(n) => {
                let (kept, tail) = split_checked(rest, *n)?;
                out.push_str(kept);
                rest = tail;
            }
            EditOp::Delete(n) => {
                let (_, tail) = split_checked(rest, *n)?;
                rest = tail;
            }
            EditOp::Insert(chunk) => out.push_str(chunk),
        }
    }
    out.push_str(rest);
    Some(out)
}

fn common_prefix(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        len += ca.len_utf8();
    }
    len
}

fn common_suffix(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (ca, cb) in a.chars().rev().zip(b.chars().rev()) {
        if ca != cb {
            break;
        }
        len += ca.len_utf8();
    }
    len
}

fn split_checked(s: &str, at: usize) -> Option<(&str, &str)> {
    if at <= s.len() && s.is_char_boundary(at) {
        Some(s.split_at(at))
    } else {
        None
    }
}
