//! Inbound response-line classification.
//!
//! The switch answers on the same line-oriented channel it accepts commands
//! on. Four kinds of lines matter; everything else (menu text, echoes,
//! prompts) is noise and classified as [`ResponseLine::Unrecognized`].
//!
//! Patterns are checked in order, first match wins:
//! 1. zone status: `o<NN> i<NN> video <token> audio <token>`
//! 2. login banner: `Connection to <host> is established`
//! 3. `Command OK`
//! 4. `Command incorrect`

use std::sync::OnceLock;

use regex::Regex;

const COMMAND_OK: &str = "Command OK";
const COMMAND_INCORRECT: &str = "Command incorrect";

/// One classified line received from the switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseLine {
    /// A zone status report. Zone bounds are checked by the connector, not
    /// here; the parser is stateless and knows nothing about configuration.
    ZoneStatus {
        zone: u8,
        input: u8,
        video_on: bool,
        audio_on: bool,
    },
    /// The unsolicited banner confirming a successful login.
    ConnectionEstablished,
    /// Positive acknowledgement of the previous command.
    Ack,
    /// Negative acknowledgement of the previous command.
    Nack,
    /// Any line that matches none of the known patterns.
    Unrecognized,
}

fn zone_status_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^o([0-9]{2}) i([0-9]{2}) video (.+) audio (.+)$")
            .expect("zone status pattern is valid")
    })
}

fn connection_established_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^Connection to (.+) is established$")
            .expect("connection banner pattern is valid")
    })
}

/// Classifies one received line.
///
/// `video`/`audio` tokens are compared case-insensitively against `ON`; any
/// other token means off. The audio token is trimmed of surrounding
/// whitespace first because some firmware revisions pad it.
pub fn parse_line(line: &str) -> ResponseLine {
    if let Some(caps) = zone_status_pattern().captures(line) {
        // Both groups are exactly two ASCII digits, so they always fit a u8.
        let zone: u8 = caps[1].parse().unwrap_or_default();
        let input: u8 = caps[2].parse().unwrap_or_default();
        let video_on = caps[3].eq_ignore_ascii_case("ON");
        let audio_on = caps[4].trim().eq_ignore_ascii_case("ON");
        return ResponseLine::ZoneStatus {
            zone,
            input,
            video_on,
            audio_on,
        };
    }
    if connection_established_pattern().is_match(line) {
        return ResponseLine::ConnectionEstablished;
    }
    if line == COMMAND_OK {
        return ResponseLine::Ack;
    }
    if line == COMMAND_INCORRECT {
        return ResponseLine::Nack;
    }
    ResponseLine::Unrecognized
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_status_line_is_parsed() {
        let parsed = parse_line("o03 i05 video ON audio OFF");
        assert_eq!(
            parsed,
            ResponseLine::ZoneStatus {
                zone: 3,
                input: 5,
                video_on: true,
                audio_on: false,
            }
        );
    }

    #[test]
    fn test_on_tokens_are_case_insensitive() {
        let parsed = parse_line("o01 i02 video on audio On");
        assert_eq!(
            parsed,
            ResponseLine::ZoneStatus {
                zone: 1,
                input: 2,
                video_on: true,
                audio_on: true,
            }
        );
    }

    #[test]
    fn test_audio_token_is_trimmed_before_comparison() {
        let parsed = parse_line("o02 i01 video OFF audio  ON ");
        assert_eq!(
            parsed,
            ResponseLine::ZoneStatus {
                zone: 2,
                input: 1,
                video_on: false,
                audio_on: true,
            }
        );
    }

    #[test]
    fn test_unknown_tokens_mean_off() {
        let parsed = parse_line("o01 i01 video enabled audio yes");
        assert_eq!(
            parsed,
            ResponseLine::ZoneStatus {
                zone: 1,
                input: 1,
                video_on: false,
                audio_on: false,
            }
        );
    }

    #[test]
    fn test_single_digit_zone_does_not_match_status_pattern() {
        assert_eq!(parse_line("o3 i5 video ON audio ON"), ResponseLine::Unrecognized);
    }

    #[test]
    fn test_connection_banner() {
        assert_eq!(
            parse_line("Connection to 10.0.0.5 is established"),
            ResponseLine::ConnectionEstablished
        );
    }

    #[test]
    fn test_banner_requires_exact_framing() {
        assert_eq!(
            parse_line("connection to 10.0.0.5 is established"),
            ResponseLine::Unrecognized
        );
        assert_eq!(
            parse_line("Connection to is established"),
            ResponseLine::Unrecognized
        );
    }

    #[test]
    fn test_ack_and_nack_are_exact_literals() {
        assert_eq!(parse_line("Command OK"), ResponseLine::Ack);
        assert_eq!(parse_line("Command incorrect"), ResponseLine::Nack);
        assert_eq!(parse_line("command ok"), ResponseLine::Unrecognized);
        assert_eq!(parse_line("Command OK "), ResponseLine::Unrecognized);
    }

    #[test]
    fn test_anything_else_is_unrecognized() {
        assert_eq!(parse_line(""), ResponseLine::Unrecognized);
        assert_eq!(parse_line("Welcome to HDMI matrix"), ResponseLine::Unrecognized);
        assert_eq!(parse_line("read"), ResponseLine::Unrecognized);
    }

    #[test]
    fn test_status_pattern_is_checked_before_the_others() {
        // A status line containing "Command OK" in its tokens still parses
        // as a status line because patterns are tried in order.
        let parsed = parse_line("o01 i01 video Command OK audio ON");
        assert!(matches!(parsed, ResponseLine::ZoneStatus { .. }));
    }
}
