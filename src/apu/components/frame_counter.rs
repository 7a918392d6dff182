//! Frame sequencer: the low-frequency clock that drives envelopes,
//! length counters, sweeps and the triangle linear counter
//!
//! Clocked once per CPU cycle. Mode 0 walks four steps over 14,915 cycles
//! and raises the frame IRQ at the last one; mode 1 walks the same
//! envelope/length pattern over 18,641 cycles without an IRQ.

use crate::apu::constants::{FRAME_STEPS_MODE_0, FRAME_STEPS_MODE_1};
use serde::{Deserialize, Serialize};

/// A sequencer tick: half-frame ticks include the quarter-frame duties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSignal {
    /// Clock envelopes and the triangle linear counter
    Quarter,
    /// Additionally clock length counters and sweeps
    Half,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameCounter {
    /// Mode 1 = 5-step ($4017 bit 7)
    five_step: bool,
    /// Frame IRQ inhibited ($4017 bit 6)
    irq_inhibit: bool,
    /// Frame IRQ latched
    irq_flag: bool,
    /// CPU cycles into the current sequence
    cycle: u32,
    /// Next step index (0-3)
    step: usize,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// $4017 write. Returns true when the caller should immediately apply
    /// a half-frame clock (mode 1 entry).
    pub fn write_control(&mut self, value: u8) -> bool {
        self.five_step = value & 0x80 != 0;
        self.irq_inhibit = value & 0x40 != 0;
        if self.irq_inhibit {
            self.irq_flag = false;
        }
        self.cycle = 0;
        self.step = 0;
        self.five_step
    }

    /// CPU-cycle clock; returns the sequencer tick due at this cycle
    pub fn clock(&mut self) -> Option<FrameSignal> {
        self.cycle += 1;
        let steps = if self.five_step {
            &FRAME_STEPS_MODE_1
        } else {
            &FRAME_STEPS_MODE_0
        };

        if self.step >= steps.len() || self.cycle < steps[self.step] {
            return None;
        }

        let signal = match self.step {
            0 | 2 => FrameSignal::Quarter,
            _ => FrameSignal::Half,
        };

        if self.step == 3 {
            if !self.five_step && !self.irq_inhibit {
                self.irq_flag = true;
            }
            self.cycle = 0;
            self.step = 0;
        } else {
            self.step += 1;
        }

        Some(signal)
    }

    pub fn irq_pending(&self) -> bool {
        self.irq_flag
    }

    /// $4015 read acknowledges the frame IRQ
    pub fn clear_irq(&mut self) {
        self.irq_flag = false;
    }
}
