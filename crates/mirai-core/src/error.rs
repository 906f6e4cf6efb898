//! Unified error types for the mirai engine.
//!
//! Only transport failures, timeouts, admission rejections and remote errors
//! ever reach a caller. Frame classification and decode problems are logged
//! and dropped by the dispatcher; [`DecodeError`] exists so the decoder
//! registry can say which of the two went wrong.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Dialing the server failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect (credentials redacted).
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The connection is gone.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Writing a frame to the socket failed.
    #[error("failed to send frame: {0}")]
    SendFailed(String),

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

impl TransportError {
    /// Creates a [`TransportError::ConnectionClosed`].
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Decode Errors
// =============================================================================

/// Why a push payload could not be turned into a typed event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// No decoder is registered for the type tag.
    #[error("no decoder registered for type tag '{0}'")]
    UnknownTag(String),

    /// The tag is known but the payload does not match its schema.
    #[error("malformed '{tag}' payload: {reason}")]
    Malformed {
        /// Type tag of the payload.
        tag: String,
        /// Underlying deserialization failure.
        reason: String,
    },
}

impl DecodeError {
    /// Creates a [`DecodeError::Malformed`] for `tag`.
    pub fn malformed(tag: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed {
            tag: tag.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while assembling a decoder registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two decoders claimed the same type tag.
    #[error("type tag '{0}' is registered twice")]
    DuplicateTag(&'static str),
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for request/response calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The session's read loop has stopped.
    #[error("bot is not connected")]
    NotConnected,
    /// No response arrived before the deadline.
    #[error("request timed out")]
    Timeout,
    /// The rate limiter refused the request under the drop policy.
    #[error("rate limit exceeded")]
    RateLimited,
    /// The server answered with a non-zero status code.
    #[error("non-zero code {code}: {message}")]
    Remote {
        /// Status code reported by the server.
        code: i64,
        /// Error message reported by the server.
        message: String,
    },
    /// Failed to serialize a request or deserialize a response.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A returned payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
