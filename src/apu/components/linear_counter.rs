//! Triangle linear counter: the second, finer-grained gate on the triangle

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearCounter {
    pub counter: u8,
    /// 7-bit reload value from $4008
    reload_value: u8,
    /// Reload requested by a $400B write
    reload_flag: bool,
    /// Control bit ($4008 bit 7): keeps the reload flag set
    control: bool,
}

impl LinearCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_control(&mut self, value: u8) {
        self.control = value & 0x80 != 0;
        self.reload_value = value & 0x7F;
    }

    /// Set by a length-register write; the counter reloads on the next
    /// quarter-frame clock
    pub fn set_reload_flag(&mut self) {
        self.reload_flag = true;
    }

    /// Quarter-frame clock
    pub fn clock(&mut self) {
        if self.reload_flag {
            self.counter = self.reload_value;
        } else if self.counter > 0 {
            self.counter -= 1;
        }

        if !self.control {
            self.reload_flag = false;
        }
    }

    pub fn is_active(&self) -> bool {
        self.counter > 0
    }
}
