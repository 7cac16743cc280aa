//! Mode state machine: current mode, score and the auxiliary velocity.

/// The adapter's operating mode. Exactly one is active at a time and it
/// changes only through command decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Fallback after an unknown command.
    #[default]
    Idle,
    /// Menu screen on the host; edges still pass through.
    Home,
    /// Play with the push buttons.
    Button,
    /// Play with the potentiometer.
    Potentiometer,
    /// Play with the infrared reflectance sensor.
    Infrared,
    /// Play with the ultrasonic range sensor.
    Ultrasonic,
    /// Host reported the run ended; score held for a save.
    GameOver,
}

impl Mode {
    /// Name shown on the status display and echoed to the host.
    pub const fn label(self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::Home => "Home",
            Mode::Button => "Button",
            Mode::Potentiometer => "Potentiometer",
            Mode::Infrared => "Infrared",
            Mode::Ultrasonic => "Ultrasound",
            Mode::GameOver => "GAME OVER",
        }
    }

    /// High-score slot this mode plays for, if it is a scoring mode.
    pub const fn score_slot(self) -> Option<ScoreSlot> {
        match self {
            Mode::Button => Some(ScoreSlot::Button),
            Mode::Infrared => Some(ScoreSlot::Infrared),
            Mode::Potentiometer => Some(ScoreSlot::Potentiometer),
            Mode::Ultrasonic => Some(ScoreSlot::Ultrasonic),
            _ => None,
        }
    }

    /// Whether the tick pulse should start analog conversions.
    pub const fn wants_analog(self) -> bool {
        matches!(self, Mode::Potentiometer | Mode::Infrared)
    }

    /// Whether the tick pulse should request ranging passes.
    pub const fn wants_range(self) -> bool {
        matches!(self, Mode::Ultrasonic)
    }

    /// Whether interrupt edges and polled lines are reported in this mode.
    pub const fn reports_edges(self) -> bool {
        matches!(self, Mode::Button | Mode::Home)
    }
}

/// One per scoring mode, in the order of the `best_score:` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScoreSlot {
    Button,
    Infrared,
    Potentiometer,
    Ultrasonic,
}

impl ScoreSlot {
    pub const COUNT: usize = 4;

    /// All slots, in index order.
    pub const ALL: [ScoreSlot; Self::COUNT] = [
        ScoreSlot::Button,
        ScoreSlot::Infrared,
        ScoreSlot::Potentiometer,
        ScoreSlot::Ultrasonic,
    ];

    pub const fn index(self) -> usize {
        match self {
            ScoreSlot::Button => 0,
            ScoreSlot::Infrared => 1,
            ScoreSlot::Potentiometer => 2,
            ScoreSlot::Ultrasonic => 3,
        }
    }

    /// Fixed byte address in the non-volatile store.
    pub const fn address(self) -> u8 {
        100 + self.index() as u8
    }
}

/// Owns the active mode, the running score and the host-supplied
/// vertical velocity (display only).
///
/// The slot of the last scoring mode entered is remembered so a save
/// issued from `GameOver` still lands in the right slot.
#[derive(Debug, Default)]
pub struct ModeMachine {
    mode: Mode,
    score: i32,
    velocity: i16,
    played: Option<ScoreSlot>,
}

impl ModeMachine {
    pub const fn new() -> Self {
        Self {
            mode: Mode::Idle,
            score: 0,
            velocity: 0,
            played: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn velocity(&self) -> i16 {
        self.velocity
    }

    pub fn played_slot(&self) -> Option<ScoreSlot> {
        self.played
    }

    /// Transition to `mode`. Resets the score except when entering
    /// `GameOver`, where it stays pending a save.
    pub fn enter(&mut self, mode: Mode) {
        if let Some(slot) = mode.score_slot() {
            self.played = Some(slot);
        }
        if !matches!(mode, Mode::GameOver) {
            self.score = 0;
        }
        self.mode = mode;
    }

    pub fn increment_score(&mut self) {
        self.score = self.score.saturating_add(1);
    }

    pub fn set_velocity(&mut self, velocity: i16) {
        self.velocity = velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_resets_score() {
        let mut machine = ModeMachine::new();
        machine.enter(Mode::Button);
        machine.increment_score();
        machine.increment_score();
        assert_eq!(machine.score(), 2);

        machine.enter(Mode::Infrared);
        assert_eq!(machine.score(), 0);

        machine.increment_score();
        machine.enter(Mode::Home);
        assert_eq!(machine.score(), 0);
    }

    #[test]
    fn test_game_over_keeps_score_and_slot() {
        let mut machine = ModeMachine::new();
        machine.enter(Mode::Ultrasonic);
        machine.increment_score();
        machine.enter(Mode::GameOver);
        assert_eq!(machine.score(), 1);
        assert_eq!(machine.played_slot(), Some(ScoreSlot::Ultrasonic));
    }

    #[test]
    fn test_slot_addresses() {
        assert_eq!(ScoreSlot::Button.address(), 100);
        assert_eq!(ScoreSlot::Infrared.address(), 101);
        assert_eq!(ScoreSlot::Potentiometer.address(), 102);
        assert_eq!(ScoreSlot::Ultrasonic.address(), 103);
    }

    #[test]
    fn test_mode_gates() {
        assert!(Mode::Infrared.wants_analog());
        assert!(Mode::Potentiometer.wants_analog());
        assert!(!Mode::Button.wants_analog());
        assert!(Mode::Ultrasonic.wants_range());
        assert!(!Mode::Home.wants_range());
        assert!(Mode::Button.reports_edges());
        assert!(Mode::Home.reports_edges());
        assert!(!Mode::Infrared.reports_edges());
    }

    #[test]
    fn test_no_slot_before_first_scoring_mode() {
        let machine = ModeMachine::new();
        assert_eq!(machine.played_slot(), None);
    }
}
