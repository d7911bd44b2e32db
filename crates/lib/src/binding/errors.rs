//! Errors for the document binding facade.

use thiserror::Error;

use crate::schema::SchemaError;
use crate::snapshot::{Patch, Value};

/// Errors from the document binding.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BindingError {
    /// A mutation or remote batch produced a state the schema rejects.
    ///
    /// The live tree has been restored to `old_state`; `patches` describes
    /// the change that was rejected.
    #[error("schema violation: {violation}")]
    SchemaViolation {
        #[source]
        violation: SchemaError,
        old_state: Value,
        new_state: Value,
        patches: Vec<Patch>,
    },

    /// The state a constructor started from failed validation.
    #[error("initial state rejected: {violation}")]
    InvalidSeed {
        #[source]
        violation: SchemaError,
        state: Value,
    },

    /// An operation on a disposed binding.
    #[error("operation \"{operation}\" on a disposed document")]
    UseAfterDispose { operation: String },

    /// A binary delta that could not be decoded.
    #[error("malformed delta: {reason}")]
    MalformedDelta { reason: String },

    /// A decoded delta the engine refused to integrate.
    #[error("delta rejected by the engine: {reason}")]
    DeltaRejected { reason: String },

    /// A state vector that could not be decoded.
    #[error("malformed state vector: {reason}")]
    MalformedStateVector { reason: String },
}

impl BindingError {
    /// True when a schema rejected either a change or a seed state.
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            BindingError::SchemaViolation { .. } | BindingError::InvalidSeed { .. }
        )
    }

    pub fn is_use_after_dispose(&self) -> bool {
        matches!(self, BindingError::UseAfterDispose { .. })
    }

    /// True for any failure to decode or integrate wire bytes.
    pub fn is_delta_error(&self) -> bool {
        matches!(
            self,
            BindingError::MalformedDelta { .. }
                | BindingError::DeltaRejected { .. }
                | BindingError::MalformedStateVector { .. }
        )
    }
}

// Conversion to crate-level Error

impl From<BindingError> for crate::Error {
    fn from(err: BindingError) -> Self {
        crate::Error::Binding(err)
    }
}
