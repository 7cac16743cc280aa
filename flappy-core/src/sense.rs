//! Sensor acquisition: polled edge detection, analog threshold with
//! hysteresis, and bounded busy-wait ultrasonic ranging.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Fixed goodness threshold for the infrared reflectance reading, on the
/// 8-bit sample scale.
pub const INFRA_THRESHOLD: u8 = 50;

/// Width of the trigger pulse sent to the ultrasonic sensor, microseconds.
pub const TRIGGER_PULSE_US: u32 = 10;

/// Step between echo-pin polls, microseconds.
pub const ECHO_POLL_US: u32 = 10;

/// Iteration cap on each echo busy-wait (30 ms at 10 us per poll).
pub const ECHO_POLL_LIMIT: u16 = 3000;

/// Round-trip microseconds per centimeter of distance.
pub const US_PER_CM: u32 = 58;

/// Distance reported past the poll cap, centimeters.
pub const MAX_RANGE_CM: u16 = (ECHO_POLL_LIMIT as u32 * ECHO_POLL_US / US_PER_CM) as u16;

/// Single-shot detector for a polled digital line.
///
/// Emits exactly once on the low-to-high transition and re-arms only
/// after the line has returned low, so the event count matches the
/// transition count no matter how long the line is held.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    armed: bool,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self { armed: false }
    }

    /// Feed the current line level; returns `true` on a fresh rising edge.
    pub fn update(&mut self, level: bool) -> bool {
        if level {
            let fired = self.armed;
            self.armed = false;
            fired
        } else {
            self.armed = true;
            false
        }
    }
}

/// Threshold comparator with a "was good" latch.
///
/// Fires once when the sample rises above [`INFRA_THRESHOLD`] after
/// having been at or below it, and stays quiet while the reading is
/// held past the threshold. Avoids flooding the protocol with repeats.
#[derive(Debug, Default)]
pub struct ThresholdLatch {
    armed: bool,
}

impl ThresholdLatch {
    pub const fn new() -> Self {
        Self { armed: false }
    }

    /// Feed one conversion result; returns `true` on the goodness edge.
    pub fn update(&mut self, sample: u8) -> bool {
        if sample > INFRA_THRESHOLD {
            let fired = self.armed;
            self.armed = false;
            fired
        } else {
            self.armed = true;
            false
        }
    }
}

/// A distance measurement in centimeters.
///
/// [`Range::OUT_OF_RANGE`] is the reserved no-echo/timeout value; it is
/// the maximum reportable distance, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Range(u16);

impl Range {
    /// Sentinel for "no echo within the timeout window".
    pub const OUT_OF_RANGE: Range = Range(MAX_RANGE_CM);

    pub const fn from_cm(cm: u16) -> Self {
        Self(cm)
    }

    pub const fn centimeters(self) -> u16 {
        self.0
    }

    pub const fn is_out_of_range(self) -> bool {
        self.0 >= MAX_RANGE_CM
    }
}

/// A blocking distance sensor.
///
/// The measurement may busy-wait for its entire duration; only the
/// ultrasonic mode invokes it, so nothing else needs liveness while it
/// runs. It cannot fail: a missing echo reports the sentinel.
pub trait RangeSensor {
    fn measure(&mut self) -> Range;
}

/// Trigger/echo ultrasonic ranger over embedded-hal pins.
///
/// Asserts the trigger for [`TRIGGER_PULSE_US`], busy-waits for the echo
/// to rise and then to fall, both bounded by [`ECHO_POLL_LIMIT`] polls,
/// and converts the counted high time to centimeters via [`US_PER_CM`].
pub struct Ranger<TRIG, ECHO, D> {
    trigger: TRIG,
    echo: ECHO,
    delay: D,
}

impl<TRIG, ECHO, D> Ranger<TRIG, ECHO, D>
where
    TRIG: OutputPin,
    ECHO: InputPin,
    D: DelayNs,
{
    pub fn new(trigger: TRIG, echo: ECHO, delay: D) -> Self {
        Self {
            trigger,
            echo,
            delay,
        }
    }

    /// One ranging pass. Pin faults fold into `None`.
    fn try_measure(&mut self) -> Option<Range> {
        self.trigger.set_high().ok()?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low().ok()?;

        // Wait for the echo to start.
        let mut polls: u16 = 0;
        while !self.echo.is_high().ok()? {
            if polls >= ECHO_POLL_LIMIT {
                return Some(Range::OUT_OF_RANGE);
            }
            self.delay.delay_us(ECHO_POLL_US);
            polls += 1;
        }

        // Count how long it stays high.
        let mut elapsed: u16 = 0;
        while self.echo.is_high().ok()? {
            if elapsed >= ECHO_POLL_LIMIT {
                return Some(Range::OUT_OF_RANGE);
            }
            self.delay.delay_us(ECHO_POLL_US);
            elapsed += 1;
        }

        let us = elapsed as u32 * ECHO_POLL_US;
        Some(Range((us / US_PER_CM) as u16))
    }
}

impl<TRIG, ECHO, D> RangeSensor for Ranger<TRIG, ECHO, D>
where
    TRIG: OutputPin,
    ECHO: InputPin,
    D: DelayNs,
{
    fn measure(&mut self) -> Range {
        self.try_measure().unwrap_or(Range::OUT_OF_RANGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[test]
    fn test_edge_detector_single_shot() {
        let mut edge = EdgeDetector::new();
        // Held high at boot: no event until the line has been seen low.
        assert!(!edge.update(true));
        assert!(!edge.update(true));
        assert!(!edge.update(false));
        assert!(edge.update(true));
        // Held high: one event only.
        assert!(!edge.update(true));
        assert!(!edge.update(true));
        assert!(!edge.update(false));
        assert!(edge.update(true));
    }

    #[test]
    fn test_edge_count_matches_transitions() {
        let mut edge = EdgeDetector::new();
        let levels = [
            false, true, true, false, false, true, false, true, true, true,
        ];
        let emitted: usize = levels.iter().filter(|&&l| edge.update(l)).count();
        assert_eq!(emitted, 3);
    }

    #[test]
    fn test_threshold_latch_fires_on_crossing() {
        let mut latch = ThresholdLatch::new();
        let samples = [10, 20, 80, 90, 30, 70, 40, 60, 55, 51];
        let fired: usize = samples.iter().filter(|&&s| latch.update(s)).count();
        // Three excursions above the threshold, three events.
        assert_eq!(fired, 3);
    }

    #[test]
    fn test_threshold_boundary() {
        let mut latch = ThresholdLatch::new();
        assert!(!latch.update(INFRA_THRESHOLD));
        assert!(latch.update(INFRA_THRESHOLD + 1));
        assert!(!latch.update(INFRA_THRESHOLD + 1));
    }

    struct NoopDelay;

    impl DelayNs for NoopDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    struct FakeTrigger;

    impl embedded_hal::digital::ErrorType for FakeTrigger {
        type Error = Infallible;
    }

    impl OutputPin for FakeTrigger {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    /// Echo pin scripted by poll index: low for `rise_after` polls, then
    /// high for `high_for` polls, then low again.
    struct ScriptedEcho {
        rise_after: u32,
        high_for: u32,
        polls: u32,
    }

    impl ScriptedEcho {
        fn new(rise_after: u32, high_for: u32) -> Self {
            Self {
                rise_after,
                high_for,
                polls: 0,
            }
        }
    }

    impl embedded_hal::digital::ErrorType for ScriptedEcho {
        type Error = Infallible;
    }

    impl InputPin for ScriptedEcho {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            let n = self.polls;
            self.polls += 1;
            Ok(n >= self.rise_after && n < self.rise_after + self.high_for)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|h| !h)
        }
    }

    #[test]
    fn test_ranging_known_echo_duration() {
        // Echo held high for 58 polls = 580 us round trip = 10 cm.
        let mut ranger = Ranger::new(FakeTrigger, ScriptedEcho::new(5, 58), NoopDelay);
        let range = ranger.measure();
        assert!(!range.is_out_of_range());
        assert_eq!(range.centimeters(), 10);
    }

    #[test]
    fn test_ranging_timeout_reports_sentinel() {
        // Echo never rises.
        let mut ranger = Ranger::new(FakeTrigger, ScriptedEcho::new(u32::MAX, 0), NoopDelay);
        let range = ranger.measure();
        assert_eq!(range, Range::OUT_OF_RANGE);
        assert!(range.is_out_of_range());
        assert_ne!(range.centimeters(), 0);
    }

    #[test]
    fn test_ranging_stuck_echo_is_bounded() {
        // Echo rises and never falls; the fall wait must still terminate.
        let mut ranger = Ranger::new(FakeTrigger, ScriptedEcho::new(0, u32::MAX), NoopDelay);
        assert_eq!(ranger.measure(), Range::OUT_OF_RANGE);
    }
}
