//! Volume envelope generator
//!
//! Runs in one of two modes: constant volume, or a 15-to-0 decay clocked
//! by the frame sequencer's quarter-frame ticks, optionally looping.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    /// Restart requested by a length-register write
    start: bool,
    /// Divider fed by the volume parameter
    divider: u8,
    /// Current decay level (15 down to 0)
    decay_level: u8,
    /// Volume parameter: constant volume, or the divider period
    volume: u8,
    /// Constant-volume mode (register bit 4)
    constant: bool,
    /// Loop the decay (register bit 5, shared with length halt)
    pub looping: bool,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure from the channel's control register (bits 0-5)
    pub fn write_control(&mut self, value: u8) {
        self.volume = value & 0x0F;
        self.constant = value & 0x10 != 0;
        self.looping = value & 0x20 != 0;
    }

    /// Restart the decay on the next quarter-frame clock
    pub fn restart(&mut self) {
        self.start = true;
    }

    /// Quarter-frame clock
    pub fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay_level = 15;
            self.divider = self.volume;
        } else if self.divider == 0 {
            self.divider = self.volume;
            if self.decay_level > 0 {
                self.decay_level -= 1;
            } else if self.looping {
                self.decay_level = 15;
            }
        } else {
            self.divider -= 1;
        }
    }

    /// Current output volume (0-15)
    pub fn volume(&self) -> u8 {
        if self.constant {
            self.volume
        } else {
            self.decay_level
        }
    }
}
