//! # hdmx-core
//!
//! Shared library for the HDMI matrix switch driver containing the
//! line-protocol codec and domain entities.
//!
//! This crate is used by the driver application and by tests. It has zero
//! dependencies on sockets, timers, or the async runtime.
//!
//! - **`protocol`** – How text travels over the wire. Structured commands
//!   are rendered into the switch's terse command lines (`sw i01 o03`,
//!   `mute o02 on`, …) and inbound response lines are classified into typed
//!   variants (zone status, login banner, ACK/NACK).
//!
//! - **`domain`** – Pure state types: the per-zone status snapshot
//!   ([`ZoneState`]), the profile save/load action, display-name lookup for
//!   input sources and profiles, and the hardware bounds shared by the
//!   validation layer.

pub mod domain;
pub mod protocol;

pub use domain::names::SourceNames;
pub use domain::profile::ProfileAction;
pub use domain::zone::ZoneState;
pub use domain::{MAX_SUPPORTED_PROFILES, MAX_SUPPORTED_ZONES, MIN_POLL_INTERVAL_SECS};
pub use protocol::command::MatrixCommand;
pub use protocol::response::{parse_line, ResponseLine};
