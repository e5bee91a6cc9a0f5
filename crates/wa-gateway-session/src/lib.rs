//! # wa-gateway-session
//!
//! Session lifecycle management for wa-gateway.
//!
//! This crate provides:
//! - The lifecycle state machine as a pure transition function
//! - Session records holding state and the pending QR code
//! - The event bridge applying client events to a record
//! - The session registry ([`ClientManager`]) with its guarded accessor
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on wa-gateway-core
//! and wa-gateway-driver to manage messaging session lifecycles.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod manager;
pub mod qr;
pub mod record;
pub mod state;

// Re-export commonly used types
pub use bridge::EventBridge;
pub use manager::{ClientManager, ClientManagerConfig, CreateOptions};
pub use qr::{decode_data_url, render_data_url};
pub use record::SessionRecord;
pub use state::transition;
