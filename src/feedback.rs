//! Player-facing feedback: multiplexed 7-segment score display, buzzer
//! tones and the RTT-backed status surface.

use defmt::info;
use embassy_rp::gpio::Output;
use embassy_time::Timer;
use flappy_core::{DigitScanner, StatusScreen, Tone};

/// Four-digit common-cathode display on eleven GPIO lines.
///
/// Segment lines map a..g to bits 0..6 of the scan pattern; digit
/// select lines are active high, one per scan step.
pub struct SevenSegment {
    segments: [Output<'static>; 7],
    digits: [Output<'static>; 4],
    scanner: DigitScanner,
}

impl SevenSegment {
    pub fn new(segments: [Output<'static>; 7], digits: [Output<'static>; 4]) -> Self {
        Self {
            segments,
            digits,
            scanner: DigitScanner::new(),
        }
    }

    /// Advance the scan by one digit and drive the pins for it.
    pub fn step(&mut self, value: u16) {
        let (select, pattern) = self.scanner.step(value);
        // Blank the selects before the segment lines change.
        for digit in self.digits.iter_mut() {
            digit.set_low();
        }
        for (bit, segment) in self.segments.iter_mut().enumerate() {
            if pattern & (1 << bit) != 0 {
                segment.set_high();
            } else {
                segment.set_low();
            }
        }
        for (bit, digit) in self.digits.iter_mut().enumerate() {
            if select & (1 << bit) != 0 {
                digit.set_high();
            }
        }
    }
}

/// Square-wave buzzer on one GPIO line.
pub struct Buzzer {
    pin: Output<'static>,
}

impl Buzzer {
    pub fn new(pin: Output<'static>) -> Self {
        Self { pin }
    }

    /// Play one tone to completion. Each half-cycle lasts
    /// `tone.period` times 10 microseconds, for `tone.duration` cycles.
    pub async fn play(&mut self, tone: Tone) {
        let half = tone.period as u64 * 10;
        for _ in 0..tone.duration {
            self.pin.set_high();
            Timer::after_micros(half).await;
            self.pin.set_low();
            Timer::after_micros(half).await;
        }
    }
}

/// Status surface over the defmt RTT channel.
///
/// Stands in for the character LCD of the hand-wired build; each row
/// write becomes one log line.
pub struct RttScreen {
    row: u8,
}

impl RttScreen {
    pub const fn new() -> Self {
        Self { row: 0 }
    }
}

impl StatusScreen for RttScreen {
    fn set_cursor(&mut self, _col: u8, row: u8) {
        self.row = row;
    }

    fn write_text(&mut self, text: &str) {
        if self.row == 0 {
            info!("mode: {}", text);
        } else {
            info!("status: {}", text);
        }
    }

    fn fill(&mut self, lit: bool) {
        if lit {
            info!("screen: fill");
        } else {
            info!("screen: clear");
        }
    }
}
