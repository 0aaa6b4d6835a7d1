//! hdmx-driver library entry point.
//!
//! Re-exports the module tree so that integration tests in `tests/` and the
//! binary in `main.rs` share it.
//!
//! # How the pieces fit together
//!
//! One [`application::Session`] drives one switch endpoint described by a
//! [`config::SessionConfig`]. The session builds a connector per connection
//! attempt; the connector owns a transport (a raw TCP link to the switch's
//! telnet port) and translates between line text and typed events. Zone
//! state flows out through the caller's [`application::ZoneStateSink`],
//! availability through a `watch` channel, and commands come in through the
//! session's passthrough methods.

/// Application layer: connector and session orchestrator.
pub mod application;

/// Session endpoint configuration.
pub mod config;

/// Infrastructure layer: the transports.
pub mod infrastructure;
