//! Sensor front-ends: polled digital lines, potentiometer scaling and
//! the ultrasonic ranger.

use embassy_rp::gpio::{Input, Output};
use embassy_time::Delay;
use flappy_core::{Levels, Ranger};

/// The two level-polled digital lines, read once per main-loop pass.
pub struct PolledLines {
    aux: Input<'static>,
    flap: Input<'static>,
}

impl PolledLines {
    pub fn new(aux: Input<'static>, flap: Input<'static>) -> Self {
        Self { aux, flap }
    }

    pub fn levels(&self) -> Levels {
        Levels {
            aux: self.aux.is_high(),
            flap: self.flap.is_high(),
        }
    }
}

/// Scale a 12-bit ADC conversion to the 8-bit protocol range.
pub fn scale_adc(raw: u16) -> u8 {
    (raw >> 4) as u8
}

/// Trigger/echo ranger on GPIO, timed with the blocking embassy delay.
pub type UltrasonicRanger = Ranger<Output<'static>, Input<'static>, Delay>;

pub fn ultrasonic(trigger: Output<'static>, echo: Input<'static>) -> UltrasonicRanger {
    Ranger::new(trigger, echo, Delay)
}
