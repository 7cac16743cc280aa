//! High-score persistence over a byte-addressed non-volatile store.

use crate::mode::ScoreSlot;

/// Byte-addressed non-volatile storage.
///
/// `write` blocks until the hardware has committed; there is no retry
/// path, a non-completing store is outside this crate's responsibility.
pub trait ScoreStore {
    fn read(&mut self, address: u8) -> u8;
    fn write(&mut self, address: u8, value: u8);
}

/// The four per-mode best scores, loaded once at boot and written back
/// only when strictly beaten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighScores {
    slots: [u8; ScoreSlot::COUNT],
}

impl HighScores {
    /// Read all slots from the store.
    pub fn load(store: &mut impl ScoreStore) -> Self {
        let mut slots = [0; ScoreSlot::COUNT];
        for slot in ScoreSlot::ALL {
            slots[slot.index()] = store.read(slot.address());
        }
        Self { slots }
    }

    pub fn best(&self, slot: ScoreSlot) -> u8 {
        self.slots[slot.index()]
    }

    pub fn all(&self) -> &[u8; ScoreSlot::COUNT] {
        &self.slots
    }

    /// Persist `score` into `slot` if it strictly exceeds the stored
    /// best. Scores are clamped to the single-byte storage format.
    /// Returns whether a write happened.
    pub fn record(&mut self, slot: ScoreSlot, score: i32, store: &mut impl ScoreStore) -> bool {
        let clamped = score.clamp(0, u8::MAX as i32) as u8;
        if clamped > self.slots[slot.index()] {
            self.slots[slot.index()] = clamped;
            store.write(slot.address(), clamped);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    struct MemStore {
        cells: [u8; 256],
        writes: Vec<(u8, u8)>,
    }

    impl Default for MemStore {
        fn default() -> Self {
            Self {
                cells: [0; 256],
                writes: Vec::new(),
            }
        }
    }

    impl ScoreStore for MemStore {
        fn read(&mut self, address: u8) -> u8 {
            self.cells[address as usize]
        }

        fn write(&mut self, address: u8, value: u8) {
            self.cells[address as usize] = value;
            self.writes.push((address, value));
        }
    }

    #[test]
    fn test_load_reads_fixed_addresses() {
        let mut store = MemStore::default();
        store.cells[100] = 3;
        store.cells[101] = 5;
        store.cells[102] = 7;
        store.cells[103] = 9;
        let scores = HighScores::load(&mut store);
        assert_eq!(scores.all(), &[3, 5, 7, 9]);
        assert_eq!(scores.best(ScoreSlot::Potentiometer), 7);
    }

    #[test]
    fn test_record_only_on_strict_improvement() {
        let mut store = MemStore::default();
        store.cells[100] = 3;
        let mut scores = HighScores::load(&mut store);

        assert!(!scores.record(ScoreSlot::Button, 3, &mut store));
        assert!(!scores.record(ScoreSlot::Button, 2, &mut store));
        assert!(store.writes.is_empty());

        assert!(scores.record(ScoreSlot::Button, 4, &mut store));
        assert_eq!(store.writes, [(100, 4)]);
        assert_eq!(scores.best(ScoreSlot::Button), 4);
    }

    #[test]
    fn test_best_never_decreases() {
        let mut store = MemStore::default();
        let mut scores = HighScores::load(&mut store);
        let mut previous = 0;
        for score in [0, 5, 2, 9, 9, 1, 12, -3, 12, 13] {
            scores.record(ScoreSlot::Infrared, score, &mut store);
            let best = scores.best(ScoreSlot::Infrared);
            assert!(best >= previous);
            previous = best;
        }
        assert_eq!(previous, 13);
    }

    #[test]
    fn test_score_clamped_to_byte() {
        let mut store = MemStore::default();
        let mut scores = HighScores::load(&mut store);
        assert!(scores.record(ScoreSlot::Ultrasonic, 1000, &mut store));
        assert_eq!(scores.best(ScoreSlot::Ultrasonic), 255);
        // Negative scores never persist.
        assert!(!scores.record(ScoreSlot::Button, -5, &mut store));
    }
}
