//! Per-zone status snapshot of one output port of the matrix switch.

/// Status of a single output zone as reported by the switch.
///
/// A fresh value is constructed for every parsed status line and handed to
/// the session by value; there is no shared mutable zone state anywhere.
///
/// The switch has no independent audio-mute command: audio is always the
/// logical inverse of mute, so only `mute` is stored and [`ZoneState::audio_on`]
/// derives the audio flag from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneState {
    /// Output zone number, 1-based.
    pub zone: u8,
    /// Selected input source, string-encoded small positive integer.
    pub input: String,
    /// Whether the zone's audio is muted.
    pub mute: bool,
    /// Whether video output is enabled.
    pub video_on: bool,
    /// CEC pass-through flag. The status line does not report it, so this
    /// stays `None` for parsed states.
    pub cec_enabled: Option<bool>,
}

impl ZoneState {
    /// Creates a zone state snapshot. `cec_enabled` starts out unknown.
    pub fn new(zone: u8, input: impl Into<String>, mute: bool, video_on: bool) -> Self {
        Self {
            zone,
            input: input.into(),
            mute,
            video_on,
            cec_enabled: None,
        }
    }

    /// Audio is the inverse of mute.
    pub fn audio_on(&self) -> bool {
        !self.mute
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
