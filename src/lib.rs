//! Sensor-to-serial game input adapter for RP2040.
//!
//! This crate provides the embedded half of the adapter: USB CDC
//! transport, flash-backed score storage and the sensor and feedback
//! peripherals, all driving the platform-agnostic `flappy-core` loop.

#![no_std]

// Re-export core types for convenience
pub use flappy_core::{
    Adapter, Command, DigitScanner, EdgeSource, EventRegister, HighScores, Levels, LinkError,
    MelodySequencer, Mode, Range, RangeSensor, ScoreSlot, ScoreStore, SerialLink, StatusScreen,
    TickScheduler, Tone, MAX_LINE_LENGTH, SAMPLE_DIVIDER, TICK_INTERVAL_MS,
};

pub mod feedback;
pub mod inputs;
pub mod storage;
pub mod usb_serial;

pub use feedback::{Buzzer, RttScreen, SevenSegment};
pub use inputs::{scale_adc, ultrasonic, PolledLines, UltrasonicRanger};
pub use storage::{FlashScoreStore, FLASH_SIZE};
pub use usb_serial::{configure_usb_serial, UsbSerialLink};
