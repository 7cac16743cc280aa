//! Coarse timing from the periodic tick interrupt.

use portable_atomic::{AtomicU8, Ordering};

/// Tick period, milliseconds.
pub const TICK_INTERVAL_MS: u64 = 10;

/// Ticks per "sample now" pulse (one pulse every 100 ms).
pub const SAMPLE_DIVIDER: u8 = 10;

const WANT_ANALOG: u8 = 1 << 0;
const WANT_RANGE: u8 = 1 << 1;

/// Divides the periodic tick down to a sample pulse, gated by what the
/// active mode needs.
///
/// `on_tick` is called from the tick context only; the want bits are
/// written by the main loop on mode changes and read by the tick
/// context, so both sides stay single-writer.
pub struct TickScheduler {
    count: AtomicU8,
    wants: AtomicU8,
}

impl TickScheduler {
    pub const fn new() -> Self {
        Self {
            count: AtomicU8::new(0),
            wants: AtomicU8::new(0),
        }
    }

    /// Advance the tick counter. Returns `true` on the sample pulse.
    pub fn on_tick(&self) -> bool {
        // Tick context is the only writer of the counter.
        let next = (self.count.load(Ordering::Relaxed) + 1) % SAMPLE_DIVIDER;
        self.count.store(next, Ordering::Relaxed);
        next == 0
    }

    /// Update the mode gate: which kinds of acquisition the pulse should
    /// trigger. Main loop side.
    pub fn set_wants(&self, analog: bool, range: bool) {
        let mut bits = 0;
        if analog {
            bits |= WANT_ANALOG;
        }
        if range {
            bits |= WANT_RANGE;
        }
        self.wants.store(bits, Ordering::Release);
    }

    /// Whether the pulse should start an analog conversion.
    pub fn wants_analog(&self) -> bool {
        self.wants.load(Ordering::Acquire) & WANT_ANALOG != 0
    }

    /// Whether the pulse should request a ranging pass.
    pub fn wants_range(&self) -> bool {
        self.wants.load(Ordering::Acquire) & WANT_RANGE != 0
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_every_divider_ticks() {
        let ticks = TickScheduler::new();
        let mut pulses = 0;
        for _ in 0..(SAMPLE_DIVIDER as usize * 3) {
            if ticks.on_tick() {
                pulses += 1;
            }
        }
        assert_eq!(pulses, 3);
    }

    #[test]
    fn test_wants_gate() {
        let ticks = TickScheduler::new();
        assert!(!ticks.wants_analog());
        assert!(!ticks.wants_range());

        ticks.set_wants(true, false);
        assert!(ticks.wants_analog());
        assert!(!ticks.wants_range());

        ticks.set_wants(false, true);
        assert!(!ticks.wants_analog());
        assert!(ticks.wants_range());
    }
}
