//! Domain types for the matrix switch: zone state, profiles, display names.

pub mod names;
pub mod profile;
pub mod zone;

/// Highest zone count seen on any supported matrix switch model.
pub const MAX_SUPPORTED_ZONES: u8 = 32;

/// Profile slots available on the hardware, numbered 1 through 16.
pub const MAX_SUPPORTED_PROFILES: u8 = 16;

/// Lower bound for the status poll interval in seconds.
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;
