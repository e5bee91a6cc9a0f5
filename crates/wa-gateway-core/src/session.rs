//! Session types for messaging client session management.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

lazy_static! {
    /// Alphabet accepted for client ids; the id doubles as a directory name.
    static ref SESSION_ID_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
}

/// Caller-chosen identifier of a messaging session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap a session id.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if SESSION_ID_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidInput(format!(
                "invalid sessionId '{value}': expected 1-64 characters of [A-Za-z0-9_-]"
            )))
        }
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Client constructed, handshake in progress
    Initializing,
    /// Waiting for the pairing QR code to be scanned
    Qr,
    /// Credentials accepted, client still loading
    Authenticated,
    /// Credentials rejected
    AuthFailure,
    /// Fully authenticated and usable
    Ready,
    /// Connection lost
    Disconnected,
    /// Handle torn down; the record is no longer registered
    Destroyed,
}

impl SessionState {
    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Qr => "qr",
            Self::Authenticated => "authenticated",
            Self::AuthFailure => "auth_failure",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
            Self::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pending pairing challenge and its rendered image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCode {
    /// Raw challenge string emitted by the client
    pub challenge: String,
    /// `data:image/png;base64,...` rendering of the challenge
    pub image: String,
}

/// Snapshot of a session as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Session identifier
    pub session_id: SessionId,
    /// Current lifecycle state
    pub state: SessionState,
    /// Whether a QR code is waiting to be scanned
    #[serde(rename = "hasQR")]
    pub has_qr: bool,
}

/// Acknowledgement returned by lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Always true; failures are reported as errors
    pub success: bool,
    /// Human readable outcome
    pub message: String,
}

impl Ack {
    /// Create a successful acknowledgement.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
