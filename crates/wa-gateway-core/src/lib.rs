//! # wa-gateway-core
//!
//! Core types for the wa-gateway REST server.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other wa-gateway crates. It provides:
//!
//! - Session types (SessionId, SessionState, SessionInfo, QrCode, Ack)
//! - Lifecycle events emitted by the messaging client
//! - Error types
//! - Server configuration
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other wa-gateway crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod event;
pub mod session;

// Re-export commonly used types
pub use config::{
    AuthSettings, DriverSettings, RateLimitSettings, ServerConfig, ServerSettings,
};
pub use error::{Error, Result};
pub use event::ClientEvent;
pub use session::{Ack, QrCode, SessionId, SessionInfo, SessionState};
