//!
//! Veneer: schema-validated plain-value snapshots over Yjs shared types.
//! This library keeps an ordinary JSON-like value in lockstep with a
//! collaborative document, translating between the two in both directions.
//!
//! ## Core Concepts
//!
//! * **Snapshots (`snapshot::Value`)**: The plain, immutable rendition of a document.
//!   Cloning is cheap and unchanged branches are shared between snapshots.
//! * **Schemas (`schema::Schema`)**: A declared document shape. Every state a binding
//!   commits has passed validation; changes that would break the shape are rolled back.
//! * **Patches (`snapshot::Patch`)**: Path-addressed add/replace/remove operations,
//!   produced by diffing two snapshots and consumed by the patch applicator.
//! * **Bindings (`binding::DocBinding`)**: The facade owning an engine document.
//!   Local mutations go in through [`DocBinding::update`]; remote binary deltas come in
//!   through [`DocBinding::apply_remote_deltas`]; subscribers see each committed state.
//! * **Text paths (`snapshot::TextPathSet`)**: String fields declared collaborative.
//!   They live as shared text primitives and change by character-level edit scripts
//!   instead of whole-value replacement.

pub mod apply;
pub mod binding;
pub mod bridge;
pub mod constants;
pub mod replay;
pub mod schema;
pub mod snapshot;
pub mod text;

pub use binding::{DocBinding, Lifecycle, ListenerId};
pub use schema::{PrimitiveKind, Schema, SchemaNode};
pub use snapshot::{Patch, PatchOp, PathStep, TextPathSet, Value};

/// Y-CRDT types re-exported for convenience.
///
/// This module re-exports commonly used types from the `yrs` crate so that client code
/// doesn't need to add `yrs` as a separate dependency for delta plumbing.
pub mod y_crdt {
    pub use yrs::*;
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured schema errors from the schema module
    #[error(transparent)]
    Schema(schema::SchemaError),

    /// Structured conversion errors from the bridge module
    #[error(transparent)]
    Bridge(bridge::BridgeError),

    /// Structured patch application errors from the apply module
    #[error(transparent)]
    Apply(apply::ApplyError),

    /// Structured event replay errors from the replay module
    #[error(transparent)]
    Replay(replay::ReplayError),

    /// Structured facade errors from the binding module
    #[error(transparent)]
    Binding(binding::BindingError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Schema(_) => "schema",
            Error::Bridge(_) => "bridge",
            Error::Apply(_) => "apply",
            Error::Replay(_) => "replay",
            Error::Binding(_) => "binding",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error reports a snapshot the schema rejected.
    pub fn is_schema_violation(&self) -> bool {
        match self {
            Error::Schema(schema_err) => schema_err.is_violation(),
            Error::Binding(binding_err) => binding_err.is_schema_violation(),
            _ => false,
        }
    }

    /// Check if this error reports a malformed schema document.
    pub fn is_schema_definition_error(&self) -> bool {
        match self {
            Error::Schema(schema_err) => schema_err.is_definition_error(),
            _ => false,
        }
    }

    /// Check if this error reports a patch addressing an impossible location.
    pub fn is_structural_violation(&self) -> bool {
        match self {
            Error::Apply(apply_err) => apply_err.is_structural_violation(),
            _ => false,
        }
    }

    /// Check if this error reports an engine event the replayer cannot interpret.
    pub fn is_unsupported_event(&self) -> bool {
        match self {
            Error::Replay(replay_err) => replay_err.is_unsupported_event(),
            _ => false,
        }
    }

    /// Check if this error reports an operation on a disposed binding.
    pub fn is_use_after_dispose(&self) -> bool {
        match self {
            Error::Binding(binding_err) => binding_err.is_use_after_dispose(),
            _ => false,
        }
    }

    /// Check if this error reports bad wire bytes (deltas or state vectors).
    pub fn is_delta_error(&self) -> bool {
        match self {
            Error::Binding(binding_err) => binding_err.is_delta_error(),
            _ => false,
        }
    }

    /// Check if this error reports a shared type or content outside the
    /// supported map/sequence/text model.
    pub fn is_unsupported_type(&self) -> bool {
        match self {
            Error::Bridge(_) => true,
            Error::Replay(replay::ReplayError::Bridge(_)) => true,
            _ => false,
        }
    }
}
