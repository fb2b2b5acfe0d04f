//! Error types for the request adapter.
//!
//! # Design
//! Every failure carries a human-readable message through `Display`. Two
//! variants are signals rather than plain failures: `Unauthorized` (the
//! adapter reloads the page) and `SessionTerminated` (the adapter already
//! showed the notice and is navigating away). Callers check
//! `is_session_terminated` and stay quiet for the latter.

use thiserror::Error;

use crate::session::SESSION_TERMINATED_MESSAGE;

/// Boxed error produced by a transport before any response arrived.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `ApiClient` and `RequestAdapter`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The network exchange failed before a response was received.
    #[error("transport failed: {0}")]
    Transport(#[source] TransportError),

    /// Non-JSON 401/403: the server-side session is gone.
    #[error("session expired or unauthorized")]
    Unauthorized { status: u16 },

    /// Non-JSON 5xx response.
    #[error("critical server error (status {status})")]
    ServerError { status: u16 },

    /// Non-JSON response on any other status.
    #[error("invalid server response, JSON expected (status {status})")]
    InvalidResponse { status: u16 },

    /// The body claimed to be JSON but did not parse.
    #[error("malformed JSON response: {0}")]
    DeserializationError(String),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The server's time budget ran out. Already handled by the adapter.
    #[error("{}", SESSION_TERMINATED_MESSAGE)]
    SessionTerminated { redirect_url: String },

    /// A failure reported by the backend inside a recognized envelope, or a
    /// non-2xx JSON body.
    #[error("{message}")]
    Business { status: u16, message: String },
}

impl ApiError {
    /// True for the already-handled session expiry, which callers must not
    /// present again.
    pub fn is_session_terminated(&self) -> bool {
        matches!(self, ApiError::SessionTerminated { .. })
    }

    /// HTTP status associated with this error, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status }
            | ApiError::ServerError { status }
            | ApiError::InvalidResponse { status }
            | ApiError::Business { status, .. } => Some(*status),
            ApiError::SessionTerminated { .. } => Some(403),
            ApiError::Transport(_)
            | ApiError::DeserializationError(_)
            | ApiError::SerializationError(_) => None,
        }
    }

    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ApiError::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_terminated_has_fixed_message() {
        let err = ApiError::SessionTerminated {
            redirect_url: "/x".to_string(),
        };
        assert_eq!(err.to_string(), "session terminated by server");
        assert!(err.is_session_terminated());
    }

    #[test]
    fn business_error_displays_backend_message() {
        let err = ApiError::Business {
            status: 400,
            message: "Empresa no encontrada".to_string(),
        };
        assert_eq!(err.to_string(), "Empresa no encontrada");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_session_terminated());
    }

    #[test]
    fn server_error_includes_status() {
        let err = ApiError::ServerError { status: 502 };
        assert_eq!(err.to_string(), "critical server error (status 502)");
    }

    #[test]
    fn transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ApiError::transport(io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.status(), None);
    }
}
