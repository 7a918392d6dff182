//! Triangle wave channel
//!
//! Steps a fixed 32-entry sequence; the timer runs at the CPU clock and
//! the sequence only advances while both the length counter and the
//! linear counter are non-zero.

use crate::apu::components::{LengthCounter, LinearCounter, Timer};
use crate::apu::constants::TRIANGLE_SEQUENCE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriangleChannel {
    pub(crate) enabled: bool,
    /// Position in the 32-step sequence
    sequence_position: u8,
    pub(crate) length_counter: LengthCounter,
    pub(crate) linear_counter: LinearCounter,
    pub(crate) timer: Timer,
}

impl TriangleChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// $4008: control/halt bit + linear counter reload value
    pub fn write_control(&mut self, value: u8) {
        self.length_counter.set_halt(value & 0x80 != 0);
        self.linear_counter.write_control(value);
    }

    /// $400A: timer low byte
    pub fn write_timer_low(&mut self, value: u8) {
        let high = (self.timer.period >> 8) as u8;
        self.timer.set_period(value, high);
    }

    /// $400B: timer high bits + length load; flags a linear reload
    pub fn write_timer_high(&mut self, value: u8) {
        let low = self.timer.period as u8;
        self.timer.set_period(low, value & 0x07);

        if self.enabled {
            self.length_counter.load(value >> 3);
        }
        self.linear_counter.set_reload_flag();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length_counter.clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.length_counter.is_active()
    }

    /// CPU-rate timer clock
    pub fn clock_timer(&mut self) {
        if self.timer.clock()
            && self.length_counter.is_active()
            && self.linear_counter.is_active()
        {
            self.sequence_position = (self.sequence_position + 1) % 32;
        }
    }

    pub fn clock_length_counter(&mut self) {
        self.length_counter.clock();
    }

    pub fn clock_linear_counter(&mut self) {
        self.linear_counter.clock();
    }

    /// Current sample (0-15); the sequence holds its last value while
    /// gated, rather than snapping to zero
    pub fn output(&self) -> u8 {
        if !self.is_active() || !self.linear_counter.is_active() {
            return 0;
        }
        TRIANGLE_SEQUENCE[self.sequence_position as usize]
    }
}
