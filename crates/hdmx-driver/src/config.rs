//! TOML-based session endpoint configuration.
//!
//! The configuration is supplied once when a session is created and stays
//! immutable for the session's lifetime; changing any field means tearing
//! the session down and starting a new one.
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return
//! value of `some_fn()` when the field is absent from the TOML file, so a
//! minimal file only needs the hostname and zone counts:
//!
//! ```toml
//! hostname = "10.0.0.5"
//! username = "administrator"
//! password = "password"
//! input_sources = 8
//! output_zones = 8
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use hdmx_core::{MAX_SUPPORTED_ZONES, MIN_POLL_INTERVAL_SECS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The poll interval is below the supported minimum.
    #[error("the poll interval must be at least {MIN_POLL_INTERVAL_SECS} seconds, got {0}")]
    PollIntervalTooShort(u64),

    /// The configured input source count is outside the supported range.
    #[error("input source count must be in range [1, {MAX_SUPPORTED_ZONES}], got {0}")]
    InputSourcesOutOfRange(u8),

    /// The configured output zone count is outside the supported range.
    #[error("output zone count must be in range [1, {MAX_SUPPORTED_ZONES}], got {0}")]
    OutputZonesOutOfRange(u8),
}

/// Which link the session uses to reach the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Raw TCP to the switch's telnet port.
    Telnet,
    /// RS-232 link. Selectable but not implemented.
    Serial,
}

/// Everything the session needs to know about one switch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hostname or IP address of the switch.
    pub hostname: String,
    /// TCP port of the switch's telnet interface.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Transport selection; serial is accepted but reports "not supported".
    #[serde(default = "default_transport")]
    pub transport: TransportKind,
    /// Login name, sent blindly after connecting.
    #[serde(default)]
    pub username: String,
    /// Login password, sent blindly after the username.
    #[serde(default)]
    pub password: String,
    /// Number of input sources the switch actually has.
    #[serde(default)]
    pub input_sources: u8,
    /// Number of output zones the switch actually has.
    #[serde(default)]
    pub output_zones: u8,
    /// Seconds between status polls once logged in. Minimum 10.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Comma-separated display names for the input sources.
    #[serde(default)]
    pub input_names: String,
    /// Comma-separated display names for the routing profiles.
    #[serde(default)]
    pub profile_names: String,
}

fn default_port() -> u16 {
    23
}
fn default_transport() -> TransportKind {
    TransportKind::Telnet
}
fn default_poll_interval() -> u64 {
    30
}

impl SessionConfig {
    /// Checks the bounds that make a session impossible to run. These are
    /// caller errors: the session refuses to start rather than retrying.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            return Err(ConfigError::PollIntervalTooShort(self.poll_interval_secs));
        }
        if self.input_sources < 1 || self.input_sources > MAX_SUPPORTED_ZONES {
            return Err(ConfigError::InputSourcesOutOfRange(self.input_sources));
        }
        if self.output_zones < 1 || self.output_zones > MAX_SUPPORTED_ZONES {
            return Err(ConfigError::OutputZonesOutOfRange(self.output_zones));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Loads a [`SessionConfig`] from the given TOML file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read and
/// [`ConfigError::Parse`] when the TOML is malformed. Validation is a
/// separate step so callers can construct configs programmatically too.
pub fn load_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SessionConfig = toml::from_str(&content)?;
    Ok(config)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SessionConfig {
        SessionConfig {
            hostname: "10.0.0.5".to_string(),
            port: 23,
            transport: TransportKind::Telnet,
            username: "administrator".to_string(),
            password: "password".to_string(),
            input_sources: 8,
            output_zones: 8,
            poll_interval_secs: 30,
            input_names: String::new(),
            profile_names: String::new(),
        }
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_poll_interval_below_minimum_is_rejected() {
        let mut cfg = valid_config();
        cfg.poll_interval_secs = 9;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::PollIntervalTooShort(9))
        ));

        // Exactly the minimum is fine.
        cfg.poll_interval_secs = 10;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zone_counts_must_be_within_supported_range() {
        let mut cfg = valid_config();
        cfg.output_zones = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutputZonesOutOfRange(0))
        ));

        cfg.output_zones = 33;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutputZonesOutOfRange(33))
        ));

        cfg.output_zones = 32;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_input_source_count_is_checked_too() {
        let mut cfg = valid_config();
        cfg.input_sources = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InputSourcesOutOfRange(0))
        ));
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let toml_str = r#"
hostname = "10.0.0.5"
input_sources = 4
output_zones = 4
"#;
        let cfg: SessionConfig = toml::from_str(toml_str).expect("deserialize minimal");
        assert_eq!(cfg.port, 23);
        assert_eq!(cfg.transport, TransportKind::Telnet);
        assert_eq!(cfg.poll_interval_secs, 30);
        assert!(cfg.username.is_empty());
    }

    #[test]
    fn test_transport_kind_parses_lowercase() {
        let toml_str = r#"
hostname = "switch.local"
transport = "serial"
input_sources = 4
output_zones = 4
"#;
        let cfg: SessionConfig = toml::from_str(toml_str).expect("deserialize");
        assert_eq!(cfg.transport, TransportKind::Serial);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let cfg = valid_config();
        let toml_str = toml::to_string(&cfg).expect("serialize");
        let restored: SessionConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result: Result<SessionConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }
}
