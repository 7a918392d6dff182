//! Pulse wave channel (pulse 1 and pulse 2)

use crate::apu::components::{Envelope, LengthCounter, Sweep, Timer};
use crate::apu::constants::DUTY_PATTERNS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseChannel {
    /// Enabled via $4015
    pub(crate) enabled: bool,
    /// Duty selection (0-3)
    pub(crate) duty: u8,
    /// Position in the 8-step duty sequence
    duty_position: u8,
    pub(crate) envelope: Envelope,
    pub(crate) sweep: Sweep,
    pub(crate) length_counter: LengthCounter,
    pub(crate) timer: Timer,
}

impl PulseChannel {
    /// `channel_number` (1 or 2) picks the sweep negation flavour
    pub fn new(channel_number: u8) -> Self {
        Self {
            enabled: false,
            duty: 0,
            duty_position: 0,
            envelope: Envelope::new(),
            sweep: Sweep::new(channel_number),
            length_counter: LengthCounter::new(),
            timer: Timer::new(),
        }
    }

    /// $4000/$4004: duty, halt/loop, envelope
    pub fn write_control(&mut self, value: u8) {
        self.duty = (value >> 6) & 0x03;
        self.length_counter.set_halt(value & 0x20 != 0);
        self.envelope.write_control(value);
    }

    /// $4001/$4005: sweep setup
    pub fn write_sweep(&mut self, value: u8) {
        self.sweep.write_control(value);
    }

    /// $4002/$4006: timer low byte
    pub fn write_timer_low(&mut self, value: u8) {
        let high = (self.timer.period >> 8) as u8;
        self.timer.set_period(value, high);
    }

    /// $4003/$4007: timer high bits + length load; restarts the envelope
    /// and the duty sequence
    pub fn write_timer_high(&mut self, value: u8) {
        let low = self.timer.period as u8;
        self.timer.set_period(low, value & 0x07);

        if self.enabled {
            self.length_counter.load(value >> 3);
        }
        self.envelope.restart();
        self.duty_position = 0;
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

    /// Timer clock at CPU/2
    pub fn clock_timer(&mut self) {
        if self.timer.clock() {
            self.duty_position = (self.duty_position + 1) % 8;
        }
    }

    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    pub fn clock_length_counter(&mut self) {
        self.length_counter.clock();
    }

    /// Half-frame sweep clock; may retune the timer
    pub fn clock_sweep(&mut self) {
        if let Some(period) = self.sweep.clock(self.timer.period) {
            self.timer.set_period_direct(period);
        }
    }

    /// Current sample: duty bit times envelope volume, gated by the length
    /// counter and the sweep's mute check
    pub fn output(&self) -> u8 {
        if !self.is_active() || self.sweep.is_muting(self.timer.period) {
            return 0;
        }
        if DUTY_PATTERNS[self.duty as usize][self.duty_position as usize] == 0 {
            return 0;
        }
        self.envelope.volume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sounding_pulse() -> PulseChannel {
        let mut pulse = PulseChannel::new(1);
        pulse.set_enabled(true);
        pulse.write_control(0b0111_1111); // 25% duty, constant volume 15
        pulse.write_timer_low(0x40);
        pulse.write_timer_high(0x00); // loads length, period 0x040
        pulse
    }

    #[test]
    fn test_write_control_parses_fields() {
        let mut pulse = PulseChannel::new(1);
        pulse.write_control(0b1010_0101);
        assert_eq!(pulse.duty, 2);
    }

    #[test]
    fn test_timer_period_from_split_bytes() {
        let mut pulse = PulseChannel::new(1);
        pulse.write_timer_low(0x34);
        pulse.set_enabled(true);
        pulse.write_timer_high(0b0010_0101); // high 5, length index 4
        assert_eq!(pulse.timer.period, 0x534);
    }

    #[test]
    fn test_length_load_requires_enable() {
        let mut pulse = PulseChannel::new(1);
        pulse.write_timer_high(0x08);
        assert!(!pulse.length_counter.is_active());

        pulse.set_enabled(true);
        pulse.write_timer_high(0x08);
        assert!(pulse.length_counter.is_active());
    }

    #[test]
    fn test_disable_clears_length() {
        let mut pulse = sounding_pulse();
        assert!(pulse.is_active());

        pulse.set_enabled(false);
        assert!(!pulse.is_active());
        assert_eq!(pulse.length_counter.counter, 0);
    }

    #[test]
    fn test_duty_position_advances_and_wraps() {
        let mut pulse = PulseChannel::new(1);
        pulse.timer.set_period_direct(0);
        pulse.duty_position = 7;
        pulse.clock_timer();
        assert_eq!(pulse.duty_position, 0);
    }

    #[test]
    fn test_write_timer_high_resets_duty_position() {
        let mut pulse = sounding_pulse();
        pulse.duty_position = 5;
        pulse.write_timer_high(0x00);
        assert_eq!(pulse.duty_position, 0);
    }

    #[test]
    fn test_output_follows_duty_sequence() {
        let mut pulse = sounding_pulse();

        // 25% duty: positions 1 and 2 are high
        pulse.duty_position = 1;
        assert_eq!(pulse.output(), 15);
        pulse.duty_position = 3;
        assert_eq!(pulse.output(), 0);
    }

    #[test]
    fn test_output_muted_by_short_period() {
        let mut pulse = sounding_pulse();
        pulse.timer.set_period_direct(5); // below 8
        pulse.duty_position = 1;
        assert_eq!(pulse.output(), 0);
    }

    #[test]
    fn test_output_zero_when_disabled() {
        let pulse = PulseChannel::new(1);
        assert_eq!(pulse.output(), 0);
    }
}
