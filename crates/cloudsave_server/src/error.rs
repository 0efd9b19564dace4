//! Error types for the CloudSave server.

use cloudsave_protocol::{RemoteError, RemoteErrorCode};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the CloudSave server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// Invalid request format or contents.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authorization failed.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The project id is not served here.
    #[error("unknown project: {0}")]
    UnknownProject(String),

    /// The addressed key or file does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Protocol version mismatch.
    #[error("protocol version mismatch: {0}")]
    ProtocolMismatch(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServerError::Internal(_))
    }

    /// Returns the reason code sent to clients.
    pub fn code(&self) -> RemoteErrorCode {
        match self {
            ServerError::InvalidRequest(_) | ServerError::ProtocolMismatch(_) => {
                RemoteErrorCode::InvalidArgument
            }
            ServerError::NotAuthorized(_) => RemoteErrorCode::Unauthorized,
            ServerError::UnknownProject(_) => RemoteErrorCode::ProjectNotFound,
            ServerError::NotFound(_) => RemoteErrorCode::NotFound,
            ServerError::Internal(_) => RemoteErrorCode::Internal,
        }
    }

    /// Converts into the wire error.
    pub fn to_remote(&self) -> RemoteError {
        RemoteError::new(self.code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServerError::NotFound("key 'a'".into()).is_client_error());
        assert!(ServerError::Internal("oops".into()).is_server_error());
        assert!(!ServerError::InvalidRequest("bad".into()).is_server_error());
    }

    #[test]
    fn remote_codes() {
        let remote = ServerError::NotFound("file 'x'".into()).to_remote();
        assert_eq!(remote.code, RemoteErrorCode::NotFound);
        assert_eq!(remote.message, "file 'x' not found");

        assert_eq!(
            ServerError::ProtocolMismatch("v9".into()).code(),
            RemoteErrorCode::InvalidArgument
        );
        assert_eq!(
            ServerError::UnknownProject("p".into()).code(),
            RemoteErrorCode::ProjectNotFound
        );
    }
}
