//! Error types for wa-gateway.

use thiserror::Error;

use crate::{SessionId, SessionState};

/// Main error type for wa-gateway operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A live record already exists for this session id
    #[error("Session already exists: {0}")]
    SessionAlreadyExists(SessionId),

    /// No record exists for this session id
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session exists but is not ready for use
    #[error("Session not ready. Current state: {state}")]
    SessionNotReady {
        /// Session that was asked for
        session_id: SessionId,
        /// State the session was in at the time
        state: SessionState,
    },

    /// No pending QR code for this session
    #[error("QR code not available. Session might be authenticated or not initialized.")]
    QrNotAvailable(SessionId),

    /// The client library failed while starting the session
    #[error("Failed to initialize session {session_id}: {reason}")]
    InitializationFailed {
        /// Session that was being created
        session_id: SessionId,
        /// Error reported by the client library
        reason: String,
    },

    /// The client library failed while tearing down or logging out
    #[error("Failed to tear down session {session_id}: {reason}")]
    TeardownFailed {
        /// Session that was being torn down
        session_id: SessionId,
        /// Error reported by the client library
        reason: String,
    },

    /// Session limit reached
    #[error("Session limit reached (max: {0})")]
    SessionLimitReached(usize),

    /// Timeout waiting for condition
    #[error("Timeout waiting for condition after {0}ms")]
    WaitTimeout(u64),

    /// Operation rejected by the client library
    #[error("Client error: {0}")]
    Client(String),

    /// Transport to the driver process failed
    #[error("Driver error: {0}")]
    Driver(String),

    /// QR challenge could not be rendered
    #[error("QR render error: {0}")]
    QrRender(String),

    /// Invalid input or parameters (generic)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
