//! Errors for patch application against the live tree.

use thiserror::Error;

/// Errors from applying a patch to the shared tree.
///
/// Every variant is a structural violation: the patch addressed a location
/// that cannot exist or cannot hold the patched value. The tree keeps
/// whatever the transaction has already applied; rolling back is the
/// caller's job.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Only replace is valid at the document root.
    #[error("cannot {op} at the document root, only replace is supported")]
    RootRequiresReplace { op: String },

    /// A root replacement carried a non-object value.
    #[error("document root must be an object, found {found}")]
    RootNotObject { found: String },

    /// A patch addressed a location its parent container cannot hold.
    #[error("structural violation: {patch} does not fit parent {parent_kind}")]
    StructuralViolation { patch: String, parent_kind: String },

    /// A path step addressed a missing entry.
    #[error("no value at \"{path}\"")]
    PathNotFound { path: String },

    /// A path step tried to descend through something that has no children
    /// of that shape.
    #[error("cannot traverse {kind} at \"{path}\"")]
    NotTraversable { path: String, kind: String },

    /// A sequence index past the end of the sequence.
    #[error("index {index} out of bounds at \"{path}\" (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
}

impl ApplyError {
    /// True for every patch-shape error, which is all of them today.
    pub fn is_structural_violation(&self) -> bool {
        matches!(
            self,
            ApplyError::RootRequiresReplace { .. }
                | ApplyError::RootNotObject { .. }
                | ApplyError::StructuralViolation { .. }
                | ApplyError::PathNotFound { .. }
                | ApplyError::NotTraversable { .. }
                | ApplyError::IndexOutOfBounds { .. }
        )
    }
}

// Conversion to crate-level Error

impl From<ApplyError> for crate::Error {
    fn from(err: ApplyError) -> Self {
        crate::Error::Apply(err)
    }
}
