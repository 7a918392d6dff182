//! Pulse sweep unit: periodically bends the channel's timer period
//!
//! The target period is `timer +/- (timer >> shift)`. Pulse 1 negates in
//! one's complement, pulse 2 in two's complement. A target above $7FF or a
//! timer below 8 mutes the channel even while the sweep is disabled.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sweep {
    enabled: bool,
    /// Divider period from register bits 4-6
    period: u8,
    negate: bool,
    shift: u8,
    /// Divider reload requested by a register write
    reload: bool,
    divider: u8,
    /// Pulse 1 uses one's-complement negation
    ones_complement: bool,
}

impl Sweep {
    /// `channel_number` is 1 or 2; it selects the negation flavour
    pub fn new(channel_number: u8) -> Self {
        Sweep {
            enabled: false,
            period: 0,
            negate: false,
            shift: 0,
            reload: false,
            divider: 0,
            ones_complement: channel_number == 1,
        }
    }

    pub fn write_control(&mut self, value: u8) {
        self.enabled = value & 0x80 != 0;
        self.period = (value >> 4) & 0x07;
        self.negate = value & 0x08 != 0;
        self.shift = value & 0x07;
        self.reload = true;
    }

    /// The period the sweep is driving the timer towards
    fn target_period(&self, current: u16) -> u16 {
        let delta = current >> self.shift;
        if self.negate {
            let sub = if self.ones_complement { delta + 1 } else { delta };
            current.saturating_sub(sub)
        } else {
            current + delta
        }
    }

    /// Whether the channel is forced silent by the sweep's range check
    pub fn is_muting(&self, current: u16) -> bool {
        current < 8 || (!self.negate && self.target_period(current) > 0x7FF)
    }

    /// Half-frame clock; returns the new timer period when an update lands
    pub fn clock(&mut self, current: u16) -> Option<u16> {
        let mut updated = None;

        if self.divider == 0
            && self.enabled
            && self.shift > 0
            && !self.is_muting(current)
        {
            updated = Some(self.target_period(current));
        }

        if self.divider == 0 || self.reload {
            self.divider = self.period;
            self.reload = false;
        } else {
            self.divider -= 1;
        }

        updated
    }
}
