//! Paths into nested snapshots.
//!
//! Patches and change events address locations as sequences of [`PathStep`]s.
//! For display and for text-bearing field declarations the same sequence
//! renders to a dotted/bracketed string, either with concrete indices
//! (`posts[3].body`) or with every index collapsed to a wildcard
//! (`posts[*].body`).

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One step into a nested snapshot: a sequence index or an object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    /// Position in a sequence.
    Index(usize),
    /// Key in an object, or the reserved `length` key on sequences.
    Key(String),
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_string())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(key) => write!(f, "{key}"),
            PathStep::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Renders a path with concrete indices, e.g. `posts[3].body`.
pub fn render_path(path: &[PathStep]) -> String {
    render_with(path, |out, index| {
        out.push('[');
        out.push_str(&index.to_string());
        out.push(']');
    })
}

/// Renders a path with every index collapsed to `[*]`, e.g. `posts[*].body`.
pub fn wildcard_path(path: &[PathStep]) -> String {
    render_with(path, |out, _| out.push_str("[*]"))
}

fn render_with(path: &[PathStep], mut index_fmt: impl FnMut(&mut String, usize)) -> String {
    let mut out = String::new();
    for step in path {
        match step {
            PathStep::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathStep::Index(index) => index_fmt(&mut out, *index),
        }
    }
    out
}

/// The set of string fields backed by collaborative text primitives.
///
/// Patterns are wildcard-rendered paths (`posts[*].body`, `bio`). A string
/// whose path matches a pattern is stored as a shared text type and edited
/// with character-level operations; every other string is an atomic leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPathSet {
    patterns: HashSet<String>,
}

impl TextPathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pattern, returning false if it was already present.
    pub fn insert(&mut self, pattern: impl Into<String>) -> bool {
        self.patterns.insert(pattern.into())
    }

    /// Whether the field at `path` is text-backed.
    pub fn matches(&self, path: &[PathStep]) -> bool {
        !self.patterns.is_empty() && self.patterns.contains(&wildcard_path(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

impl<S: Into<String>> FromIterator<S> for TextPathSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().map(Into::into).collect(),
        }
    }
}
