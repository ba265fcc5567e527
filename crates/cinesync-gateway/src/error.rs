use thiserror::Error;

/// Failures reported by a [`DocumentStore`](crate::DocumentStore) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("permission denied on {0}")]
    PermissionDenied(String),
    #[error("no document at {0}")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to persist documents: {0}")]
    Persistence(String),
}

/// Failures surfaced by the user-document gateway.
///
/// A document that does not exist yet is not an error; reads return `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("not connected to the document store: {0}")]
    NotConnected(String),
    #[error("write to {path} rejected: {reason}")]
    WriteRejected { path: String, reason: String },
}

impl GatewayError {
    pub(crate) fn read_failed(source: StoreError) -> Self {
        GatewayError::NotConnected(source.to_string())
    }

    pub(crate) fn write_failed(path: impl ToString, source: StoreError) -> Self {
        GatewayError::WriteRejected {
            path: path.to_string(),
            reason: source.to_string(),
        }
    }
}
