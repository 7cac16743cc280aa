//! Platform-agnostic core of the flappy input adapter.
//!
//! This crate holds everything with real concurrency hazards or timing
//! logic, without any platform-specific dependencies: it is usable both
//! in embedded `no_std` firmware and on the host for testing.
//!
//! # Overview
//!
//! - [`events`]: the interrupt-to-main-loop flag register ([`EventRegister`])
//! - [`tick`]: coarse timing and mode-gated sample pulses ([`TickScheduler`])
//! - [`sense`]: edge debouncing, analog hysteresis, ultrasonic ranging
//! - [`mode`]: the mode state machine and score ownership ([`ModeMachine`])
//! - [`protocol`]: host command decoding and response line encoding
//! - [`score`]: high-score persistence ([`HighScores`], [`ScoreStore`])
//! - [`adapter`]: the cooperative main-loop pass ([`Adapter`])
//! - [`feedback`]: 7-segment and tone lookup data
//!
//! # Protocol
//!
//! The host sends single-byte commands (`b`, `p`, `i`, `u`, `g`, `s`,
//! `a`) plus `v:<int>`; the adapter answers with `\n`-terminated ASCII
//! lines such as `j`, `i`, `ADC:<n>`, `u: <n> cm` and
//! `best_score:<a>-<b>-<c>-<d>`, one line per event, never batched.
//!
//! # Example
//!
//! ```rust
//! use flappy_core::{Command, EdgeSource, EventRegister};
//!
//! // Interrupt side records an edge; the main loop consumes it once.
//! let events = EventRegister::new();
//! events.set_edge(EdgeSource::Flap);
//! assert!(events.take_edge(EdgeSource::Flap));
//! assert!(!events.take_edge(EdgeSource::Flap));
//!
//! assert_eq!(Command::parse(b"v:-3"), Command::SetVelocity(-3));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod adapter;
pub mod events;
pub mod feedback;
pub mod mode;
pub mod protocol;
pub mod score;
pub mod sense;
pub mod tick;

// Re-export main types at crate root
pub use adapter::{Adapter, Levels, LinkError, SerialLink, StatusScreen};
pub use events::{EdgeSource, EventRegister};
pub use feedback::{DigitScanner, MelodySequencer, Tone, SEGMENTS};
pub use mode::{Mode, ModeMachine, ScoreSlot};
pub use protocol::{Command, LineAssembler, MAX_LINE_LENGTH};
pub use score::{HighScores, ScoreStore};
pub use sense::{EdgeDetector, Range, RangeSensor, Ranger, ThresholdLatch, INFRA_THRESHOLD};
pub use tick::{TickScheduler, SAMPLE_DIVIDER, TICK_INTERVAL_MS};
