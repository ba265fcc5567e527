use cinesync_gateway::{GatewayError, StoreError};
use thiserror::Error;

/// Failures surfaced by the sync store to its views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error("not connected to the document store: {0}")]
    NotConnected(String),
    #[error("write to {path} rejected: {reason}")]
    WriteRejected { path: String, reason: String },
    #[error("could not open the document store: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl From<GatewayError> for SyncError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::NotConnected(reason) => SyncError::NotConnected(reason),
            GatewayError::WriteRejected { path, reason } => SyncError::WriteRejected { path, reason },
        }
    }
}
