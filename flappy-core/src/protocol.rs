//! Serial command decoding and response line encoding.
//!
//! Commands are a single byte, optionally followed by a `:`-separated
//! payload (`v:<int>`). Responses are `\n`-terminated ASCII lines, one
//! per event or reply, never batched.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::mode::Mode;
use crate::sense::Range;

/// Maximum accepted command line length, including the terminator.
pub const MAX_LINE_LENGTH: usize = 64;

/// Diagnostic reply to an unrecognized command.
pub const UNKNOWN_LINE: &[u8] = b"unknown mode\n";

/// Protocol line for the auxiliary polled input.
pub const AUX_LINE: &[u8] = b"v\n";

/// Protocol line for the secondary (polled) flap input.
pub const POLLED_FLAP_LINE: &[u8] = b"j\n";

/// Protocol line for the infrared goodness edge.
pub const INFRA_LINE: &[u8] = b"i\n";

/// A decoded host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum Command {
    /// `b` - play with the push buttons.
    SelectButton,
    /// `p` - play with the potentiometer.
    SelectPotentiometer,
    /// `i` - play with the infrared sensor.
    SelectInfrared,
    /// `u` - play with the ultrasonic sensor.
    SelectUltrasonic,
    /// `g` - the host's run ended.
    EndGame,
    /// `s` - the host scored a point.
    BumpScore,
    /// `v:<int>` - vertical velocity for local display.
    SetVelocity(i16),
    /// `a` - persist the score if it beats the stored best, report all.
    SaveScore,
    /// Anything else.
    Unknown,
}

impl Command {
    /// Decode one received line. Never fails: unrecognized input maps to
    /// [`Command::Unknown`].
    pub fn parse(line: &[u8]) -> Command {
        match line.first() {
            Some(b'b') => Command::SelectButton,
            Some(b'p') => Command::SelectPotentiometer,
            Some(b'i') => Command::SelectInfrared,
            Some(b'u') => Command::SelectUltrasonic,
            Some(b'g') => Command::EndGame,
            Some(b's') => Command::BumpScore,
            Some(b'v') => Command::SetVelocity(parse_velocity(&line[1..])),
            Some(b'a') => Command::SaveScore,
            _ => Command::Unknown,
        }
    }
}

/// Accumulate the signed decimal payload of `v:<int>`.
///
/// Digits are folded left to right; anything after the first non-digit is
/// ignored. A payload with no digits therefore parses to 0 instead of
/// taking an error path.
fn parse_velocity(rest: &[u8]) -> i16 {
    let rest = match rest.first() {
        Some(b':') => &rest[1..],
        _ => rest,
    };
    let (negative, digits) = match rest.first() {
        Some(b'-') => (true, &rest[1..]),
        _ => (false, rest),
    };

    let mut value: i16 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .saturating_mul(10)
            .saturating_add((b - b'0') as i16);
    }

    if negative {
        -value
    } else {
        value
    }
}

/// Reassembles a received byte stream into command lines.
///
/// `\n` and `\r` terminate a line; [`LineAssembler::finish_chunk`] at a
/// transport chunk boundary also completes a pending line, so bare
/// single-keystroke commands work without a terminator. A line longer
/// than [`MAX_LINE_LENGTH`] is discarded whole: once the buffer
/// overflows, every byte up to the next terminator is dropped,
/// including any that arrive in later chunks.
#[derive(Debug, Default)]
pub struct LineAssembler {
    line: Vec<u8, MAX_LINE_LENGTH>,
    discarding: bool,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            discarding: false,
        }
    }

    /// Feed one received byte; returns a completed line on a terminator.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8, MAX_LINE_LENGTH>> {
        match byte {
            b'\n' | b'\r' => {
                if self.discarding {
                    self.discarding = false;
                    None
                } else {
                    self.take()
                }
            }
            _ if self.discarding => None,
            _ => {
                if self.line.push(byte).is_err() {
                    self.line.clear();
                    self.discarding = true;
                }
                None
            }
        }
    }

    /// Complete the pending line at a chunk boundary, if any.
    pub fn finish_chunk(&mut self) -> Option<Vec<u8, MAX_LINE_LENGTH>> {
        if self.discarding {
            None
        } else {
            self.take()
        }
    }

    /// Drop any partial state, for a transport reconnect.
    pub fn reset(&mut self) {
        self.line.clear();
        self.discarding = false;
    }

    fn take(&mut self) -> Option<Vec<u8, MAX_LINE_LENGTH>> {
        if self.line.is_empty() {
            None
        } else {
            Some(core::mem::take(&mut self.line))
        }
    }
}

/// Acknowledgement sent after a mode-selecting command.
pub fn ack_line(mode: Mode) -> String<16> {
    let mut line = String::new();
    let _ = writeln!(line, "{}", mode.label());
    line
}

/// Raw potentiometer reading, one line per consumed sample.
pub fn adc_line(value: u8) -> String<16> {
    let mut line = String::new();
    let _ = writeln!(line, "ADC:{}", value);
    line
}

/// Ranging result line.
pub fn range_line(range: Range) -> String<16> {
    let mut line = String::new();
    let _ = writeln!(line, "u: {} cm", range.centimeters());
    line
}

/// All four stored high scores, in slot order.
pub fn best_score_line(scores: &[u8; 4]) -> String<32> {
    let mut line = String::new();
    let _ = writeln!(
        line,
        "best_score:{}-{}-{}-{}",
        scores[0], scores[1], scores[2], scores[3]
    );
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_selects() {
        assert_eq!(Command::parse(b"b"), Command::SelectButton);
        assert_eq!(Command::parse(b"p"), Command::SelectPotentiometer);
        assert_eq!(Command::parse(b"i"), Command::SelectInfrared);
        assert_eq!(Command::parse(b"u"), Command::SelectUltrasonic);
        assert_eq!(Command::parse(b"g"), Command::EndGame);
        assert_eq!(Command::parse(b"s"), Command::BumpScore);
        assert_eq!(Command::parse(b"a"), Command::SaveScore);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse(b"x"), Command::Unknown);
        assert_eq!(Command::parse(b""), Command::Unknown);
        assert_eq!(Command::parse(b"?anything"), Command::Unknown);
    }

    #[test]
    fn test_parse_velocity() {
        assert_eq!(Command::parse(b"v:42"), Command::SetVelocity(42));
        assert_eq!(Command::parse(b"v:-7"), Command::SetVelocity(-7));
        assert_eq!(Command::parse(b"v:0"), Command::SetVelocity(0));
    }

    #[test]
    fn test_malformed_velocity_parses_to_zero() {
        assert_eq!(Command::parse(b"v:"), Command::SetVelocity(0));
        assert_eq!(Command::parse(b"v"), Command::SetVelocity(0));
        assert_eq!(Command::parse(b"v:abc"), Command::SetVelocity(0));
        assert_eq!(Command::parse(b"v:-"), Command::SetVelocity(0));
    }

    #[test]
    fn test_velocity_trailing_garbage_ignored() {
        assert_eq!(Command::parse(b"v:12x9"), Command::SetVelocity(12));
    }

    #[test]
    fn test_ack_line() {
        assert_eq!(ack_line(Mode::Button).as_str(), "Button\n");
        assert_eq!(ack_line(Mode::Ultrasonic).as_str(), "Ultrasound\n");
    }

    #[test]
    fn test_adc_line() {
        assert_eq!(adc_line(0).as_str(), "ADC:0\n");
        assert_eq!(adc_line(255).as_str(), "ADC:255\n");
    }

    #[test]
    fn test_range_line() {
        assert_eq!(range_line(Range::from_cm(12)).as_str(), "u: 12 cm\n");
    }

    #[test]
    fn test_assembler_splits_on_terminator() {
        let mut lines = LineAssembler::new();
        assert_eq!(lines.push(b'v'), None);
        assert_eq!(lines.push(b':'), None);
        assert_eq!(lines.push(b'4'), None);
        let line = lines.push(b'\n').unwrap();
        assert_eq!(&line[..], b"v:4");
        // Nothing pending afterwards, and CRLF does not yield an empty line.
        assert_eq!(lines.push(b'\n'), None);
        assert_eq!(lines.finish_chunk(), None);
    }

    #[test]
    fn test_assembler_completes_bare_keystroke_at_chunk_end() {
        let mut lines = LineAssembler::new();
        assert_eq!(lines.push(b's'), None);
        let line = lines.finish_chunk().unwrap();
        assert_eq!(&line[..], b"s");
    }

    #[test]
    fn test_assembler_drops_oversized_line_whole() {
        let mut lines = LineAssembler::new();
        for _ in 0..MAX_LINE_LENGTH + 10 {
            assert_eq!(lines.push(b'x'), None);
        }
        // The tail of the oversized line must not surface at a chunk
        // boundary, nor ahead of its terminator.
        assert_eq!(lines.finish_chunk(), None);
        assert_eq!(lines.push(b'y'), None);
        assert_eq!(lines.push(b'\n'), None);
        // The stream recovers on the next line.
        assert_eq!(lines.push(b'a'), None);
        assert_eq!(&lines.push(b'\n').unwrap()[..], b"a");
    }

    #[test]
    fn test_assembler_reset_clears_partial_line() {
        let mut lines = LineAssembler::new();
        assert_eq!(lines.push(b'b'), None);
        lines.reset();
        assert_eq!(lines.finish_chunk(), None);
    }

    #[test]
    fn test_best_score_line() {
        assert_eq!(
            best_score_line(&[4, 0, 17, 255]).as_str(),
            "best_score:4-0-17-255\n"
        );
        // Worst case must still fit the buffer.
        assert_eq!(
            best_score_line(&[255, 255, 255, 255]).as_str(),
            "best_score:255-255-255-255\n"
        );
    }
}
