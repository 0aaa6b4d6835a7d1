//! HDMI matrix switch driver entry point.
//!
//! Loads a session configuration from a TOML file (path from the first
//! argument, `hdmx.toml` by default), starts a session against the switch,
//! and logs every zone state update and availability transition until
//! Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hdmx_core::{SourceNames, ZoneState};
use hdmx_driver::application::{Session, SessionStatus, ZoneStateSink};
use hdmx_driver::config::load_config;

/// Sink that renders zone updates with the configured display names.
struct LoggingSink {
    names: SourceNames,
}

#[async_trait]
impl ZoneStateSink for LoggingSink {
    async fn zone_state_updated(&self, state: ZoneState) {
        let input = state
            .input
            .parse::<u8>()
            .map(|n| self.names.input_name(n))
            .unwrap_or_else(|_| state.input.clone());
        info!(
            "zone {}: input {}, video {}, audio {}",
            state.zone,
            input,
            if state.video_on { "on" } else { "off" },
            if state.audio_on() { "on" } else { "off" },
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("hdmx.toml"));
    let config = load_config(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;

    info!(
        "HDMI matrix driver starting for {}:{}",
        config.hostname, config.port
    );

    let sink = Arc::new(LoggingSink {
        names: SourceNames::new(&config.input_names, &config.profile_names),
    });
    let session = Session::start(config, sink).context("starting session")?;

    // Log availability transitions until Ctrl-C.
    let mut status = session.status();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                match &*status.borrow() {
                    SessionStatus::Online => info!("switch is online"),
                    SessionStatus::Offline(reason) => warn!("switch is offline: {reason}"),
                    SessionStatus::Unknown => {}
                }
            }
        }
    }

    session.shutdown();
    info!("HDMI matrix driver stopped");
    Ok(())
}
