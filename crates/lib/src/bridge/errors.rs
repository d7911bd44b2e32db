//! Errors for plain-value / shared-type conversion.

use thiserror::Error;

/// Errors from translating between snapshot values and the engine's types.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A shared type outside the supported map, sequence, and text set.
    #[error("unsupported shared type: {kind}")]
    UnsupportedSharedType { kind: String },

    /// A leaf the snapshot model cannot represent.
    #[error("unsupported leaf content: {kind}")]
    UnsupportedContent { kind: String },
}

impl BridgeError {
    pub fn is_unsupported_shared_type(&self) -> bool {
        matches!(self, BridgeError::UnsupportedSharedType { .. })
    }

    pub fn is_unsupported_content(&self) -> bool {
        matches!(self, BridgeError::UnsupportedContent { .. })
    }
}

// Conversion to crate-level Error

impl From<BridgeError> for crate::Error {
    fn from(err: BridgeError) -> Self {
        crate::Error::Bridge(err)
    }
}
