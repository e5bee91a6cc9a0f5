//! # wa-gateway-driver
//!
//! The boundary between wa-gateway and the external messaging client library.
//!
//! This crate provides:
//! - The narrow capability traits the session registry depends on
//!   ([`MessagingClient`], [`ClientFactory`], [`EventSink`])
//! - A driver client that runs the library in a child process and talks to it
//!   over newline-delimited JSON on stdio
//! - An in-memory fake for tests (behind the `testing` feature)
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on wa-gateway-core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod connection;
pub mod process;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use client::{ClientConfig, ClientFactory, EventSink, MessagingClient, PuppeteerConfig};
pub use connection::Connection;
pub use process::{DriverClient, DriverFactory};
