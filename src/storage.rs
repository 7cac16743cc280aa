//! Flash-backed high-score persistence.
//!
//! The score table occupies the last erase sector of the 2 MB boot
//! flash, well clear of the program image. A whole 256-byte page is
//! cached in RAM so byte writes turn into one erase plus one page
//! program.

use defmt::error;
use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use flappy_core::ScoreStore;

/// Pico boot flash size.
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

const STORE_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;
const PAGE_SIZE: usize = 256;

pub struct FlashScoreStore<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
    page: [u8; PAGE_SIZE],
}

impl<'d> FlashScoreStore<'d> {
    pub fn new(mut flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>) -> Self {
        let mut page = [0u8; PAGE_SIZE];
        if let Err(e) = flash.blocking_read(STORE_OFFSET, &mut page) {
            error!("score flash read failed: {:?}", e);
        }
        Self { flash, page }
    }
}

impl ScoreStore for FlashScoreStore<'_> {
    fn read(&mut self, address: u8) -> u8 {
        let value = self.page[address as usize];
        // Erased flash reads 0xFF; an empty slot is a zero score.
        if value == 0xFF {
            0
        } else {
            value
        }
    }

    fn write(&mut self, address: u8, value: u8) {
        self.page[address as usize] = value;
        let end = STORE_OFFSET + ERASE_SIZE as u32;
        if let Err(e) = self.flash.blocking_erase(STORE_OFFSET, end) {
            error!("score flash erase failed: {:?}", e);
            return;
        }
        if let Err(e) = self.flash.blocking_write(STORE_OFFSET, &self.page) {
            error!("score flash write failed: {:?}", e);
        }
    }
}
