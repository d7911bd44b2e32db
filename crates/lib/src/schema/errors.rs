//! Errors for schema parsing and document validation.

use thiserror::Error;

/// Errors from declaring a schema or validating a snapshot against one.
///
/// The first three variants are definition errors: the schema document
/// itself is malformed. The last two are violations: a snapshot does not
/// have the declared shape.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A sequence descriptor must hold exactly one element schema.
    #[error("invalid schema at \"{path}\": array descriptor needs exactly one element schema, found {found}")]
    InvalidArrayDescriptor { path: String, found: usize },

    /// A leaf descriptor named something other than a supported primitive kind.
    #[error("invalid schema at \"{path}\": unknown primitive kind \"{kind}\"")]
    UnknownKind { path: String, kind: String },

    /// A descriptor that is neither a kind name, a one-element array, nor an object.
    #[error("invalid schema at \"{path}\": descriptor must be a kind name, array, or object, found {found}")]
    MalformedDescriptor { path: String, found: String },

    /// The snapshot is missing a key the schema requires.
    #[error("schema violation at \"{path}\": missing required key")]
    MissingKey { path: String },

    /// A value's runtime kind does not match the declared one.
    #[error("schema violation at \"{path}\": expected {expected}, found {found}")]
    KindMismatch {
        path: String,
        expected: String,
        found: String,
    },
}

impl SchemaError {
    /// The schema document itself is malformed.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            SchemaError::InvalidArrayDescriptor { .. }
                | SchemaError::UnknownKind { .. }
                | SchemaError::MalformedDescriptor { .. }
        )
    }

    /// A snapshot failed validation against a well-formed schema.
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            SchemaError::MissingKey { .. } | SchemaError::KindMismatch { .. }
        )
    }

    /// The path the error refers to, in rendered form.
    pub fn path(&self) -> &str {
        match self {
            SchemaError::InvalidArrayDescriptor { path, .. }
            | SchemaError::UnknownKind { path, .. }
            | SchemaError::MalformedDescriptor { path, .. }
            | SchemaError::MissingKey { path }
            | SchemaError::KindMismatch { path, .. } => path,
        }
    }
}

// Conversion to crate-level Error

impl From<SchemaError> for crate::Error {
    fn from(err: SchemaError) -> Self {
        crate::Error::Schema(err)
    }
}
