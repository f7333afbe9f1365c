//! Shared error type across signalwatch crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Rejected configuration (junction list, config file).
    InvalidConfig,
    /// Not allowed in the current state.
    NotAllowed,
    /// Unsupported protocol or config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::InvalidConfig => "INVALID_CONFIG",
            ClientCode::NotAllowed => "NOT_ALLOWED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SignalWatchError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum SignalWatchError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("not allowed: {0}")]
    NotAllowed(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl SignalWatchError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            SignalWatchError::BadRequest(_) => ClientCode::BadRequest,
            SignalWatchError::Config(_) => ClientCode::InvalidConfig,
            SignalWatchError::NotAllowed(_) => ClientCode::NotAllowed,
            SignalWatchError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            SignalWatchError::Internal(_) => ClientCode::Internal,
        }
    }
}
