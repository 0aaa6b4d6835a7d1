//! Outbound command formatting.
//!
//! Wire format (one command per line, terminated with `\r` by the transport):
//! ```text
//! sw i{input:02} o{zone:02}     switch input source for an output zone
//! mute o{zone:02} {ON|OFF}      mute / unmute a zone
//! sw o{zone:02} {ON|OFF}        video on / off for a zone
//! cec o{zone:02} {ON|OFF}       CEC on / off for a zone
//! profile f{number} {SAVE|LOAD} store / recall a routing profile
//! read                          request a full zone status report
//! ```
//! The switch only accepts lower-case commands; the connector lower-cases the
//! rendered text immediately before transmission.

use crate::domain::profile::ProfileAction;

/// Structured representation of every command the switch understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixCommand {
    /// Routes input source `input` to output zone `zone`.
    SwitchInput { input: u8, zone: u8 },
    /// Mutes or unmutes the zone's audio.
    Mute { zone: u8, on: bool },
    /// Enables or disables the zone's video output.
    Video { zone: u8, on: bool },
    /// Enables or disables CEC pass-through for the zone.
    Cec { zone: u8, on: bool },
    /// Saves or loads routing profile `number`.
    Profile { number: u8, action: ProfileAction },
    /// Asks the switch for a status line per output zone.
    ReadStatus,
}

impl MatrixCommand {
    /// Renders the command as wire text, without the line terminator.
    pub fn to_wire(&self) -> String {
        match *self {
            MatrixCommand::SwitchInput { input, zone } => format!("sw i{input:02} o{zone:02}"),
            MatrixCommand::Mute { zone, on } => format!("mute o{zone:02} {}", on_off(on)),
            MatrixCommand::Video { zone, on } => format!("sw o{zone:02} {}", on_off(on)),
            MatrixCommand::Cec { zone, on } => format!("cec o{zone:02} {}", on_off(on)),
            MatrixCommand::Profile { number, action } => {
                format!("profile f{number} {}", action.wire_token())
            }
            MatrixCommand::ReadStatus => "read".to_string(),
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
