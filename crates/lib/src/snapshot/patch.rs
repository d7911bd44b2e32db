//! Path-addressed mutations.
//!
//! A [`Patch`] is the unit of change flowing from a snapshot diff into the
//! live document. Its wire form is `{"path": [...], "op": "...", "value": ...}`
//! with `value` omitted for removes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::path::{PathStep, render_path};
use super::value::Value;

/// A single mutation at a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Where the mutation lands. Empty means the document root.
    pub path: Vec<PathStep>,
    /// What happens there.
    #[serde(flatten)]
    pub op: PatchOp,
}

/// The operation a patch performs at its path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "lowercase")]
pub enum PatchOp {
    /// Introduce a value at a previously absent location.
    Add(Value),
    /// Overwrite the value at an existing location.
    Replace(Value),
    /// Delete the value at a location.
    Remove,
}

impl Patch {
    pub fn add(path: Vec<PathStep>, value: impl Into<Value>) -> Self {
        Self {
            path,
            op: PatchOp::Add(value.into()),
        }
    }

    pub fn replace(path: Vec<PathStep>, value: impl Into<Value>) -> Self {
        Self {
            path,
            op: PatchOp::Replace(value.into()),
        }
    }

    pub fn remove(path: Vec<PathStep>) -> Self {
        Self {
            path,
            op: PatchOp::Remove,
        }
    }

    /// A whole-document replacement.
    pub fn replace_root(value: impl Into<Value>) -> Self {
        Self::replace(Vec::new(), value)
    }

    pub fn op_name(&self) -> &'static str {
        match self.op {
            PatchOp::Add(_) => "add",
            PatchOp::Replace(_) => "replace",
            PatchOp::Remove => "remove",
        }
    }

    /// The carried value, if the operation has one.
    pub fn value(&self) -> Option<&Value> {
        match &self.op {
            PatchOp::Add(value) | PatchOp::Replace(value) => Some(value),
            PatchOp::Remove => None,
        }
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} at document root", self.op_name())
        } else {
            write!(f, "{} at \"{}\"", self.op_name(), render_path(&self.path))
        }
    }
}
