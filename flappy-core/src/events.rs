//! Interrupt-to-main-loop event register.
//!
//! A small single-producer/single-consumer flag register: the interrupt
//! context only ever sets bits, the main loop only ever test-and-clears
//! them. A second edge arriving before the first is consumed sets a bit
//! that is already set, so rapid repeats coalesce into one pending event
//! per source instead of queuing. This layer cannot fail.

use portable_atomic::{AtomicU8, Ordering};

const FLAP: u8 = 1 << 0;
const DIVE: u8 = 1 << 1;
const GLIDE: u8 = 1 << 2;
const ANALOG_READY: u8 = 1 << 3;
const RANGE_DUE: u8 = 1 << 4;

/// One monitored digital edge input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeSource {
    /// Primary flap button.
    Flap,
    /// Dive button.
    Dive,
    /// Glide button.
    Glide,
}

impl EdgeSource {
    /// All edge sources, in flag-bit order.
    pub const ALL: [EdgeSource; 3] = [EdgeSource::Flap, EdgeSource::Dive, EdgeSource::Glide];

    const fn mask(self) -> u8 {
        match self {
            EdgeSource::Flap => FLAP,
            EdgeSource::Dive => DIVE,
            EdgeSource::Glide => GLIDE,
        }
    }

    /// The protocol line emitted when this edge is consumed.
    pub const fn line(self) -> &'static [u8] {
        match self {
            EdgeSource::Flap => b"j\n",
            EdgeSource::Dive => b"b\n",
            EdgeSource::Glide => b"h\n",
        }
    }
}

/// Pending-event flags plus the latest completed analog conversion.
///
/// The setters are safe to call from interrupt context; the `take_*`
/// methods belong to the main loop. `take` is a hardware-atomic
/// read-clear, so consuming a bit twice without an intervening edge
/// returns `true` then `false`.
pub struct EventRegister {
    flags: AtomicU8,
    sample: AtomicU8,
}

impl EventRegister {
    pub const fn new() -> Self {
        Self {
            flags: AtomicU8::new(0),
            sample: AtomicU8::new(0),
        }
    }

    /// Record a digital edge. Interrupt side; set-only.
    #[inline]
    pub fn set_edge(&self, source: EdgeSource) {
        self.flags.fetch_or(source.mask(), Ordering::Release);
    }

    /// Store a completed conversion result and mark it ready. Interrupt side.
    #[inline]
    pub fn set_sample(&self, value: u8) {
        self.sample.store(value, Ordering::Relaxed);
        self.flags.fetch_or(ANALOG_READY, Ordering::Release);
    }

    /// Request one ranging pass. Tick context; set-only.
    #[inline]
    pub fn set_range_due(&self) {
        self.flags.fetch_or(RANGE_DUE, Ordering::Release);
    }

    /// Consume a pending edge, if any. Main loop only.
    #[inline]
    pub fn take_edge(&self, source: EdgeSource) -> bool {
        self.take(source.mask())
    }

    /// Consume the latest conversion result, if one is pending.
    #[inline]
    pub fn take_sample(&self) -> Option<u8> {
        if self.take(ANALOG_READY) {
            Some(self.sample.load(Ordering::Acquire))
        } else {
            None
        }
    }

    /// Consume a pending ranging request.
    #[inline]
    pub fn take_range_due(&self) -> bool {
        self.take(RANGE_DUE)
    }

    fn take(&self, mask: u8) -> bool {
        self.flags.fetch_and(!mask, Ordering::AcqRel) & mask != 0
    }
}

impl Default for EventRegister {
    fn default() -> Self {
        Self::new()
    }
}
