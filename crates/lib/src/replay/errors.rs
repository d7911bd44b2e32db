//! Errors for event capture and snapshot replay.

use thiserror::Error;

use crate::bridge::BridgeError;

/// Errors from interpreting engine events or replaying them on a snapshot.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReplayError {
    /// An event class the replayer cannot interpret.
    #[error("unsupported engine event from {kind}")]
    UnsupportedEvent { kind: String },

    /// An event path that points nowhere in the snapshot.
    #[error("event targets unknown container at \"{path}\"")]
    UnknownContainer { path: String },

    /// The snapshot holds a different container kind than the event expects.
    #[error("event/container mismatch at \"{path}\": expected {expected}, found {found}")]
    ContainerMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A delta that does not fit the container it targets.
    #[error("malformed delta at \"{path}\": {reason}")]
    MalformedDelta { path: String, reason: String },

    /// Event content could not be converted to a plain value.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl ReplayError {
    pub fn is_unsupported_event(&self) -> bool {
        matches!(self, ReplayError::UnsupportedEvent { .. })
    }

    pub fn is_malformed_delta(&self) -> bool {
        matches!(self, ReplayError::MalformedDelta { .. })
    }
}

// Conversion to crate-level Error

impl From<ReplayError> for crate::Error {
    fn from(err: ReplayError) -> Self {
        crate::Error::Replay(err)
    }
}
