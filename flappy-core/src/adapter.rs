//! The cooperative main-loop pass: command dispatch, per-mode sensor
//! consumption and event emission.

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::events::{EdgeSource, EventRegister};
use crate::feedback::Tone;
use crate::mode::{Mode, ModeMachine};
use crate::protocol::{
    ack_line, adc_line, best_score_line, range_line, Command, AUX_LINE, INFRA_LINE,
    MAX_LINE_LENGTH, POLLED_FLAP_LINE, UNKNOWN_LINE,
};
use crate::score::{HighScores, ScoreStore};
use crate::sense::{EdgeDetector, RangeSensor, ThresholdLatch};
use crate::tick::TickScheduler;

/// Error type for serial transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Transport I/O failure.
    Io,
    /// A line did not fit the transport's buffers.
    Overflow,
}

/// Line-oriented serial transport to the host.
///
/// Framing, buffering and USB enumeration live behind this trait; the
/// core only takes whole received lines and hands back whole
/// `\n`-terminated response lines.
pub trait SerialLink {
    /// True once the transport is enumerated and usable.
    fn is_ready(&self) -> bool;

    /// Take the next pending received line, if any. Taking the line
    /// clears it, so stale bytes never leak across polls.
    fn poll_line(&mut self) -> Option<Vec<u8, MAX_LINE_LENGTH>>;

    /// Queue one response line (terminator included).
    fn write_line(&mut self, line: &[u8]) -> Result<(), LinkError>;

    /// Push queued output toward the host.
    fn flush(&mut self) -> Result<(), LinkError>;
}

/// Minimal status display surface: mode name and fall state.
pub trait StatusScreen {
    fn set_cursor(&mut self, col: u8, row: u8);
    fn write_text(&mut self, text: &str);
    fn fill(&mut self, lit: bool);
}

/// Levels of the two directly polled digital lines, read once per pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levels {
    /// Auxiliary input, reported as `v`.
    pub aux: bool,
    /// Secondary flap input, reported as `j`.
    pub flap: bool,
}

/// One adapter: mode machine, score table and the per-sensor detectors,
/// driven by [`Adapter::poll`] once per main-loop pass.
pub struct Adapter<S, D> {
    machine: ModeMachine,
    scores: HighScores,
    store: S,
    screen: D,
    aux_edge: EdgeDetector,
    flap_edge: EdgeDetector,
    infra: ThresholdLatch,
}

impl<S: ScoreStore, D: StatusScreen> Adapter<S, D> {
    /// Load the high-score table from `store` and start in [`Mode::Idle`].
    pub fn new(mut store: S, screen: D) -> Self {
        let scores = HighScores::load(&mut store);
        Self {
            machine: ModeMachine::new(),
            scores,
            store,
            screen,
            aux_edge: EdgeDetector::new(),
            flap_edge: EdgeDetector::new(),
            infra: ThresholdLatch::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    pub fn score(&self) -> i32 {
        self.machine.score()
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.scores
    }

    /// One cooperative pass: decode at most one command, then consume the
    /// sensor signals the active mode cares about. Flags irrelevant to
    /// the mode are still drained so they cannot go stale.
    ///
    /// Returns a tone request when the pass asks for one.
    pub fn poll<L: SerialLink, R: RangeSensor>(
        &mut self,
        events: &EventRegister,
        ticks: &TickScheduler,
        link: &mut L,
        range: &mut R,
        levels: Levels,
    ) -> Result<Option<Tone>, LinkError> {
        if !link.is_ready() {
            // Nothing to report to; pending flags coalesce until the
            // host comes back.
            return Ok(None);
        }

        let mut tone = None;
        if let Some(line) = link.poll_line() {
            tone = self.handle_command(Command::parse(&line), ticks, link)?;
        }

        let report_edges = self.machine.mode().reports_edges();

        for source in EdgeSource::ALL {
            if events.take_edge(source) && report_edges {
                link.write_line(source.line())?;
            }
        }

        if self.aux_edge.update(levels.aux) && report_edges {
            link.write_line(AUX_LINE)?;
        }
        if self.flap_edge.update(levels.flap) && report_edges {
            link.write_line(POLLED_FLAP_LINE)?;
        }

        if let Some(sample) = events.take_sample() {
            match self.machine.mode() {
                Mode::Infrared => {
                    if self.infra.update(sample) {
                        link.write_line(INFRA_LINE)?;
                    }
                }
                Mode::Potentiometer => {
                    link.write_line(adc_line(sample).as_bytes())?;
                }
                // Other modes drain the sample unreported.
                _ => {}
            }
        }

        if events.take_range_due() && self.machine.mode() == Mode::Ultrasonic {
            let measured = range.measure();
            link.write_line(range_line(measured).as_bytes())?;
        }

        link.flush()?;
        Ok(tone)
    }

    fn handle_command<L: SerialLink>(
        &mut self,
        command: Command,
        ticks: &TickScheduler,
        link: &mut L,
    ) -> Result<Option<Tone>, LinkError> {
        match command {
            Command::SelectButton => self.select(Mode::Button, ticks, link)?,
            Command::SelectPotentiometer => self.select(Mode::Potentiometer, ticks, link)?,
            Command::SelectInfrared => self.select(Mode::Infrared, ticks, link)?,
            Command::SelectUltrasonic => self.select(Mode::Ultrasonic, ticks, link)?,
            Command::EndGame => self.select(Mode::GameOver, ticks, link)?,
            Command::BumpScore => {
                self.machine.increment_score();
                return Ok(Some(Tone::SCORE_BEEP));
            }
            Command::SetVelocity(velocity) => {
                self.machine.set_velocity(velocity);
                self.render_velocity();
            }
            Command::SaveScore => {
                if let Some(slot) = self.machine.played_slot() {
                    self.scores
                        .record(slot, self.machine.score(), &mut self.store);
                }
                link.write_line(best_score_line(self.scores.all()).as_bytes())?;
                self.enter(Mode::Home, ticks);
            }
            Command::Unknown => {
                self.enter(Mode::Idle, ticks);
                link.write_line(UNKNOWN_LINE)?;
            }
        }
        Ok(None)
    }

    fn select<L: SerialLink>(
        &mut self,
        mode: Mode,
        ticks: &TickScheduler,
        link: &mut L,
    ) -> Result<(), LinkError> {
        self.enter(mode, ticks);
        link.write_line(ack_line(mode).as_bytes())
    }

    fn enter(&mut self, mode: Mode, ticks: &TickScheduler) {
        self.machine.enter(mode);
        ticks.set_wants(mode.wants_analog(), mode.wants_range());
        self.render_status();
    }

    fn render_status(&mut self) {
        self.screen.fill(false);
        self.screen.set_cursor(0, 0);
        self.screen.write_text(self.machine.mode().label());
    }

    fn render_velocity(&mut self) {
        let mut text: String<12> = String::new();
        let _ = write!(text, "vy:{}", self.machine.velocity());
        self.screen.set_cursor(0, 1);
        self.screen.write_text(&text);
    }
}
