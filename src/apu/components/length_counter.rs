//! Length counter: silences a channel after a programmed duration

use crate::apu::constants::LENGTH_TABLE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LengthCounter {
    pub counter: u8,
    /// Halt flag (shared with envelope loop / triangle control bit)
    halt: bool,
}

impl LengthCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the 5-bit table index in register bits 3-7
    pub fn load(&mut self, index: u8) {
        self.counter = LENGTH_TABLE[(index & 0x1F) as usize];
    }

    pub fn set_halt(&mut self, halt: bool) {
        self.halt = halt;
    }

    /// Half-frame clock: count down unless halted
    pub fn clock(&mut self) {
        if !self.halt && self.counter > 0 {
            self.counter -= 1;
        }
    }

    pub fn clear(&mut self) {
        self.counter = 0;
    }

    pub fn is_active(&self) -> bool {
        self.counter > 0
    }
}
