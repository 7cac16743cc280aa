//! Local feedback: 7-segment score rendering and tone sequencing.

/// Segment patterns for the decimal digits 0-9 (bit 0 = segment a).
pub const SEGMENTS: [u8; 10] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F,
];

/// Segment pattern for one decimal digit.
pub const fn segments_for(digit: u8) -> u8 {
    SEGMENTS[(digit % 10) as usize]
}

/// Multiplex scanner for a four-digit display.
///
/// Each call renders the next digit position, so the display refreshes
/// one digit per invocation rather than at a fixed rate.
#[derive(Debug, Default)]
pub struct DigitScanner {
    position: u8,
}

impl DigitScanner {
    pub const fn new() -> Self {
        Self { position: 0 }
    }

    /// One multiplex step over `value` (shown modulo 10000). Returns the
    /// digit-select mask and the segment pattern to drive.
    pub fn step(&mut self, value: u16) -> (u8, u8) {
        let position = self.position;
        self.position = (self.position + 1) % 4;

        let mut digit = value;
        for _ in 0..position {
            digit /= 10;
        }
        (1 << position, segments_for((digit % 10) as u8))
    }
}

/// One square-wave tone: half-period delay count and duration, in the
/// units the buzzer routine counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone {
    pub period: u16,
    pub duration: u16,
}

impl Tone {
    /// The short beep played on a score increment.
    pub const SCORE_BEEP: Tone = Tone {
        period: 180,
        duration: 30,
    };
}

// Note periods for the melody build.
pub const NOTE_B4: u16 = 180;
pub const NOTE_C5: u16 = 160;
pub const NOTE_D5: u16 = 143;
pub const NOTE_E5: u16 = 127;
pub const NOTE_F5: u16 = 120;
pub const NOTE_G5: u16 = 107;
pub const NOTE_A5: u16 = 95;
pub const NOTE_B5: u16 = 90;

const SHORT: u16 = 30;
const LONG: u16 = 60;

const fn note(period: u16, duration: u16) -> Tone {
    Tone { period, duration }
}

/// Fixed melody for the alternate build, one note per triggering edge.
pub const MELODY: [Tone; 20] = [
    note(NOTE_B4, SHORT),
    note(NOTE_E5, SHORT),
    note(NOTE_D5, SHORT),
    note(NOTE_C5, LONG),
    note(NOTE_B4, SHORT),
    note(NOTE_E5, SHORT),
    note(NOTE_D5, SHORT),
    note(NOTE_C5, LONG),
    note(NOTE_D5, SHORT),
    note(NOTE_F5, SHORT),
    note(NOTE_E5, SHORT),
    note(NOTE_D5, SHORT),
    note(NOTE_C5, SHORT),
    note(NOTE_D5, SHORT),
    note(NOTE_B4, SHORT),
    note(NOTE_C5, LONG),
    note(NOTE_E5, SHORT),
    note(NOTE_C5, SHORT),
    note(NOTE_D5, SHORT),
    note(NOTE_B4, LONG),
];

/// Steps through [`MELODY`], wrapping back to the start.
#[derive(Debug, Default)]
pub struct MelodySequencer {
    index: usize,
}

impl MelodySequencer {
    pub const fn new() -> Self {
        Self { index: 0 }
    }

    pub fn next_note(&mut self) -> Tone {
        let tone = MELODY[self.index];
        self.index = (self.index + 1) % MELODY.len();
        tone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_patterns() {
        assert_eq!(segments_for(0), 0x3F);
        assert_eq!(segments_for(8), 0x7F);
        // Wraps rather than panicking on out-of-range digits.
        assert_eq!(segments_for(13), segments_for(3));
    }

    #[test]
    fn test_scanner_cycles_all_four_digits() {
        let mut scanner = DigitScanner::new();
        let score = 1234;

        let (select, segments) = scanner.step(score);
        assert_eq!(select, 0b0001);
        assert_eq!(segments, segments_for(4));

        let (select, segments) = scanner.step(score);
        assert_eq!(select, 0b0010);
        assert_eq!(segments, segments_for(3));

        let (select, segments) = scanner.step(score);
        assert_eq!(select, 0b0100);
        assert_eq!(segments, segments_for(2));

        let (select, segments) = scanner.step(score);
        assert_eq!(select, 0b1000);
        assert_eq!(segments, segments_for(1));

        // Back to the ones digit.
        let (select, _) = scanner.step(score);
        assert_eq!(select, 0b0001);
    }

    #[test]
    fn test_scanner_small_value_pads_with_zero() {
        let mut scanner = DigitScanner::new();
        let (_, ones) = scanner.step(7);
        assert_eq!(ones, segments_for(7));
        let (_, tens) = scanner.step(7);
        assert_eq!(tens, segments_for(0));
    }

    #[test]
    fn test_melody_wraps() {
        let mut melody = MelodySequencer::new();
        for expected in MELODY {
            assert_eq!(melody.next_note(), expected);
        }
        assert_eq!(melody.next_note(), MELODY[0]);
    }
}
