//! Error taxonomy shared by the session manager and every store.

use cloudsave_protocol::{ProtocolError, RemoteError, RemoteErrorCode};
use std::convert::Infallible;
use std::fmt;
use thiserror::Error;

/// Result type for store and session operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for raw backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Reason attached to transport errors caused by undecodable replies.
pub const MALFORMED_RESPONSE: &str = "malformed_response";

/// Errors surfaced to callers of the client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The session has not finished initializing.
    #[error("cloud services are not initialized")]
    NotInitialized,

    /// The session is initialized but not signed in.
    #[error("not signed in")]
    NotAuthenticated,

    /// Caller input was rejected before any network call, or the service
    /// rejected the request as invalid or misconfigured.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The addressed key or file does not exist remotely.
    #[error("'{key}' not found")]
    NotFound {
        /// The key or file name that was addressed.
        key: String,
    },

    /// Network or service-level failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message, verbatim from the transport or service.
        message: String,
        /// Reason code, when the service or decoder provided one.
        reason: Option<String>,
    },

    /// Anything that fits no other kind.
    #[error("unexpected error: {0}")]
    Unknown(String),
}

/// Discriminant of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`StoreError::NotInitialized`].
    NotInitialized,
    /// See [`StoreError::NotAuthenticated`].
    NotAuthenticated,
    /// See [`StoreError::Validation`].
    Validation,
    /// See [`StoreError::NotFound`].
    NotFound,
    /// See [`StoreError::Transport`].
    Transport,
    /// See [`StoreError::Unknown`].
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotInitialized => "NotInitialized",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Transport => "TransportError",
            ErrorKind::Unknown => "UnknownError",
        };
        f.write_str(name)
    }
}

impl StoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not-found error for a key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>, reason: Option<String>) -> Self {
        Self::Transport {
            message: message.into(),
            reason,
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotInitialized => ErrorKind::NotInitialized,
            StoreError::NotAuthenticated => ErrorKind::NotAuthenticated,
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Transport { .. } => ErrorKind::Transport,
            StoreError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Returns true if the remote entity was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Returns true if the session gate rejected the operation.
    pub fn is_gate(&self) -> bool {
        matches!(
            self,
            StoreError::NotInitialized | StoreError::NotAuthenticated
        )
    }

    /// Returns the transport reason code, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            StoreError::Transport { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

impl From<Infallible> for StoreError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Errors returned by a [`RemoteBackend`](crate::RemoteBackend).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The service answered with a rejection.
    #[error("service rejected request: {0}")]
    Remote(RemoteError),

    /// The request never got a reply (connection refused, reset, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// A body could not be encoded, or a reply could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// An unclassified failure inside the backend.
    #[error("{0}")]
    Other(String),
}

impl From<RemoteError> for BackendError {
    fn from(err: RemoteError) -> Self {
        BackendError::Remote(err)
    }
}

impl BackendError {
    /// Translates into the caller-facing taxonomy.
    ///
    /// `subject` names the key or file addressed by the failed call and is
    /// used for `NotFound`.
    pub fn into_store(self, subject: &str) -> StoreError {
        match self {
            BackendError::Remote(remote) => match remote.code {
                RemoteErrorCode::NotFound => StoreError::not_found(subject),
                RemoteErrorCode::InvalidArgument | RemoteErrorCode::ProjectNotFound => {
                    StoreError::Validation(remote.message)
                }
                RemoteErrorCode::Unauthorized
                | RemoteErrorCode::RateLimited
                | RemoteErrorCode::Unavailable
                | RemoteErrorCode::Internal => StoreError::Transport {
                    message: remote.message,
                    reason: Some(remote.code.as_str().to_string()),
                },
            },
            BackendError::Transport(message) => StoreError::Transport {
                message,
                reason: None,
            },
            BackendError::Protocol(err) => StoreError::Transport {
                message: err.to_string(),
                reason: Some(MALFORMED_RESPONSE.to_string()),
            },
            BackendError::Other(message) => StoreError::Unknown(message),
        }
    }
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        err.into_store("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_codes_map_to_kinds() {
        let cases = [
            (RemoteErrorCode::NotFound, ErrorKind::NotFound),
            (RemoteErrorCode::InvalidArgument, ErrorKind::Validation),
            (RemoteErrorCode::ProjectNotFound, ErrorKind::Validation),
            (RemoteErrorCode::Unauthorized, ErrorKind::Transport),
            (RemoteErrorCode::RateLimited, ErrorKind::Transport),
            (RemoteErrorCode::Unavailable, ErrorKind::Transport),
            (RemoteErrorCode::Internal, ErrorKind::Transport),
        ];

        for (code, kind) in cases {
            let err = BackendError::Remote(RemoteError::new(code, "x")).into_store("k");
            assert_eq!(err.kind(), kind, "{code}");
        }
    }

    #[test]
    fn not_found_carries_subject() {
        let err = BackendError::Remote(RemoteError::not_found("gone")).into_store("book_42");
        assert_eq!(err, StoreError::not_found("book_42"));
        assert!(err.is_not_found());
    }

    #[test]
    fn rate_limit_keeps_reason() {
        let err = BackendError::Remote(RemoteError::new(RemoteErrorCode::RateLimited, "slow"))
            .into_store("k");
        assert_eq!(err.reason(), Some("rate_limited"));
        assert_eq!(err.to_string(), "transport error: slow");
    }

    #[test]
    fn protocol_errors_are_malformed_responses() {
        let err: StoreError = BackendError::Protocol(ProtocolError::decoding("eof")).into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.reason(), Some(MALFORMED_RESPONSE));
    }

    #[test]
    fn connection_failures_have_no_reason() {
        let err: StoreError = BackendError::Transport("connection refused".into()).into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.reason(), None);
    }

    #[test]
    fn other_is_unknown() {
        let err: StoreError = BackendError::Other("boom".into()).into();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn gate_errors() {
        assert!(StoreError::NotInitialized.is_gate());
        assert!(StoreError::NotAuthenticated.is_gate());
        assert!(!StoreError::validation("bad").is_gate());
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(ErrorKind::Validation.to_string(), "ValidationError");
        assert_eq!(ErrorKind::Unknown.to_string(), "UnknownError");
    }
}
