// APU module - Audio Processing Unit (2A03 sound hardware)
//
// Five channels (two pulses, triangle, noise, DMC) driven by a frame
// sequencer, mixed with the NES's non-linear formula, and resampled to the
// host rate by dividing the CPU clock evenly.
//
// ## Register Map
//
// | Address       | Target                          |
// |---------------|---------------------------------|
// | $4000-$4003   | Pulse 1                         |
// | $4004-$4007   | Pulse 2                         |
// | $4008-$400B   | Triangle                        |
// | $400C-$400F   | Noise                           |
// | $4010-$4013   | DMC                             |
// | $4015         | Channel enables / status        |
// | $4017         | Frame counter                   |

pub mod channels;
pub mod components;
pub mod constants;

use channels::{DmcChannel, NoiseChannel, PulseChannel, TriangleChannel};
use components::{FrameCounter, FrameSignal};
use constants::CPU_CLOCK_NTSC;

/// Audio Processing Unit state
pub struct Apu {
    pub(crate) pulse1: PulseChannel,
    pub(crate) pulse2: PulseChannel,
    pub(crate) triangle: TriangleChannel,
    pub(crate) noise: NoiseChannel,
    pub(crate) dmc: DmcChannel,
    pub(crate) frame_counter: FrameCounter,

    /// CPU cycles elapsed; pulse timers run at half this rate
    pub(crate) cycle: u64,

    /// Fractional divider from CPU cycles to host samples
    sample_accumulator: f64,
    cycles_per_sample: f64,
    /// Samples produced since the last drain
    samples: Vec<f32>,
}

impl Apu {
    pub fn new() -> Self {
        Self::with_sample_rate(44_100)
    }

    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Apu {
            pulse1: PulseChannel::new(1),
            pulse2: PulseChannel::new(2),
            triangle: TriangleChannel::new(),
            noise: NoiseChannel::new(),
            dmc: DmcChannel::new(),
            frame_counter: FrameCounter::new(),
            cycle: 0,
            sample_accumulator: 0.0,
            cycles_per_sample: CPU_CLOCK_NTSC / sample_rate as f64,
            samples: Vec::new(),
        }
    }

    /// Reset to silence; the host sample rate is kept
    pub fn reset(&mut self) {
        let rate = self.cycles_per_sample;
        *self = Apu {
            cycles_per_sample: rate,
            ..Apu::new()
        };
    }

    /// Retarget the host sample rate
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.cycles_per_sample = CPU_CLOCK_NTSC / sample_rate as f64;
    }

    // ========================================
    // CPU-facing registers
    // ========================================

    /// Write an APU register ($4000-$4013, $4015, $4017)
    pub fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000 => self.pulse1.write_control(value),
            0x4001 => self.pulse1.write_sweep(value),
            0x4002 => self.pulse1.write_timer_low(value),
            0x4003 => self.pulse1.write_timer_high(value),

            0x4004 => self.pulse2.write_control(value),
            0x4005 => self.pulse2.write_sweep(value),
            0x4006 => self.pulse2.write_timer_low(value),
            0x4007 => self.pulse2.write_timer_high(value),

            0x4008 => self.triangle.write_control(value),
            0x400A => self.triangle.write_timer_low(value),
            0x400B => self.triangle.write_timer_high(value),

            0x400C => self.noise.write_control(value),
            0x400E => self.noise.write_mode(value),
            0x400F => self.noise.write_length(value),

            0x4010 => self.dmc.write_control(value),
            0x4011 => self.dmc.write_output_level(value),
            0x4012 => self.dmc.write_sample_address(value),
            0x4013 => self.dmc.write_sample_length(value),

            0x4015 => {
                self.pulse1.set_enabled(value & 0x01 != 0);
                self.pulse2.set_enabled(value & 0x02 != 0);
                self.triangle.set_enabled(value & 0x04 != 0);
                self.noise.set_enabled(value & 0x08 != 0);
                self.dmc.set_enabled(value & 0x10 != 0);
            }

            0x4017 => {
                if self.frame_counter.write_control(value) {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
            }

            _ => {}
        }
    }

    /// $4015 read: length-counter activity, DMC bytes, IRQ flags.
    /// Reading acknowledges the frame IRQ but not the DMC IRQ.
    pub fn read_status(&mut self) -> u8 {
        let mut status = 0;
        if self.pulse1.length_counter.is_active() {
            status |= 0x01;
        }
        if self.pulse2.length_counter.is_active() {
            status |= 0x02;
        }
        if self.triangle.length_counter.is_active() {
            status |= 0x04;
        }
        if self.noise.length_counter.is_active() {
            status |= 0x08;
        }
        if self.dmc.bytes_remaining > 0 {
            status |= 0x10;
        }
        if self.frame_counter.irq_pending() {
            status |= 0x40;
        }
        if self.dmc.irq_pending() {
            status |= 0x80;
        }

        self.frame_counter.clear_irq();
        status
    }

    /// Whether the APU is holding the CPU IRQ line (frame or DMC)
    pub fn irq_pending(&self) -> bool {
        self.frame_counter.irq_pending() || self.dmc.irq_pending()
    }

    /// Outstanding DMC sample fetch; the bus services it and pays the
    /// 4-cycle CPU stall
    pub fn dmc_fetch_request(&mut self) -> Option<u16> {
        self.dmc.fetch_request()
    }

    /// Deliver the DMC byte fetched by the bus
    pub fn dmc_load_sample(&mut self, value: u8) {
        self.dmc.load_sample(value);
    }

    // ========================================
    // Clocking
    // ========================================

    /// Advance one CPU cycle
    pub fn step(&mut self) {
        self.cycle += 1;

        // Pulse timers tick at CPU/2; triangle, noise and DMC at CPU rate
        if self.cycle % 2 == 0 {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
        }
        self.triangle.clock_timer();
        self.noise.clock_timer();
        self.dmc.clock_timer();

        match self.frame_counter.clock() {
            Some(FrameSignal::Quarter) => self.clock_quarter_frame(),
            Some(FrameSignal::Half) => {
                self.clock_quarter_frame();
                self.clock_half_frame();
            }
            None => {}
        }

        // Emit a sample whenever enough CPU time has accumulated
        self.sample_accumulator += 1.0;
        if self.sample_accumulator >= self.cycles_per_sample {
            self.sample_accumulator -= self.cycles_per_sample;
            let sample = self.mix();
            self.samples.push(sample);
        }
    }

    /// Envelopes and the triangle linear counter
    fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_envelope();
        self.pulse2.clock_envelope();
        self.noise.clock_envelope();
        self.triangle.clock_linear_counter();
    }

    /// Length counters and sweeps
    fn clock_half_frame(&mut self) {
        self.pulse1.clock_length_counter();
        self.pulse2.clock_length_counter();
        self.triangle.clock_length_counter();
        self.noise.clock_length_counter();
        self.pulse1.clock_sweep();
        self.pulse2.clock_sweep();
    }

    // ========================================
    // Mixing and output
    // ========================================

    /// Non-linear mixdown of the five channel outputs
    fn mix(&self) -> f32 {
        let p1 = self.pulse1.output() as f64;
        let p2 = self.pulse2.output() as f64;
        let t = self.triangle.output() as f64;
        let n = self.noise.output() as f64;
        let d = self.dmc.output() as f64;

        let pulse = if p1 + p2 > 0.0 {
            95.88 / (8128.0 / (p1 + p2) + 100.0)
        } else {
            0.0
        };

        let tnd_sum = t / 8227.0 + n / 12241.0 + d / 22638.0;
        let tnd = if tnd_sum > 0.0 {
            159.79 / (1.0 / tnd_sum + 100.0)
        } else {
            0.0
        };

        (pulse + tnd) as f32
    }

    /// Move the samples accumulated so far into `out`
    pub fn drain_samples(&mut self, out: &mut Vec<f32>) {
        out.append(&mut self.samples);
    }

    /// Number of samples waiting to be drained
    pub fn pending_samples(&self) -> usize {
        self.samples.len()
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reflects_length_counters() {
        let mut apu = Apu::new();
        assert_eq!(apu.read_status() & 0x0F, 0);

        apu.write_register(0x4015, 0x01); // enable pulse 1
        apu.write_register(0x4003, 0x08); // load length
        assert_eq!(apu.read_status() & 0x01, 0x01);
    }

    #[test]
    fn test_disable_silences_channel() {
        let mut apu = Apu::new();
        apu.write_register(0x4015, 0x01);
        apu.write_register(0x4003, 0x08);

        apu.write_register(0x4015, 0x00);
        assert_eq!(apu.read_status() & 0x01, 0);
    }

    #[test]
    fn test_frame_irq_raised_and_cleared_by_status_read() {
        let mut apu = Apu::new();
        for _ in 0..14915 {
            apu.step();
        }
        assert!(apu.irq_pending());

        let status = apu.read_status();
        assert_eq!(status & 0x40, 0x40);
        assert!(!apu.irq_pending());
    }

    #[test]
    fn test_five_step_mode_never_raises_irq() {
        let mut apu = Apu::new();
        apu.write_register(0x4017, 0x80);
        for _ in 0..40_000 {
            apu.step();
        }
        assert!(!apu.irq_pending());
    }

    #[test]
    fn test_irq_inhibit() {
        let mut apu = Apu::new();
        apu.write_register(0x4017, 0x40);
        for _ in 0..20_000 {
            apu.step();
        }
        assert!(!apu.irq_pending());
    }

    #[test]
    fn test_length_counters_count_down_via_sequencer() {
        let mut apu = Apu::new();
        apu.write_register(0x4015, 0x01);
        apu.write_register(0x4000, 0x00); // no halt
        apu.write_register(0x4003, 0x18); // length index 3 -> 2

        // Two half-frame ticks drain the counter
        for _ in 0..14915 {
            apu.step();
        }
        assert_eq!(apu.read_status() & 0x01, 0);
    }

    #[test]
    fn test_sample_production_rate() {
        let mut apu = Apu::with_sample_rate(44_100);
        // One frame's worth of CPU cycles ~ 29780; expect ~735 samples
        for _ in 0..29_780 {
            apu.step();
        }
        let produced = apu.pending_samples();
        assert!((730..=740).contains(&produced), "got {}", produced);
    }

    #[test]
    fn test_drain_samples_empties_buffer() {
        let mut apu = Apu::new();
        for _ in 0..1000 {
            apu.step();
        }
        let mut out = Vec::new();
        apu.drain_samples(&mut out);
        assert!(!out.is_empty());
        assert_eq!(apu.pending_samples(), 0);
    }

    #[test]
    fn test_mix_range() {
        let mut apu = Apu::new();
        apu.write_register(0x4015, 0x1F);
        apu.write_register(0x4000, 0x3F); // pulse 1 full constant volume
        apu.write_register(0x4002, 0x40);
        apu.write_register(0x4003, 0x08);

        for _ in 0..50_000 {
            apu.step();
        }
        let mut out = Vec::new();
        apu.drain_samples(&mut out);
        assert!(out.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_dmc_fetch_request_surfaces() {
        let mut apu = Apu::new();
        apu.write_register(0x4012, 0x00);
        apu.write_register(0x4013, 0x01);
        apu.write_register(0x4015, 0x10);

        apu.step();
        assert_eq!(apu.dmc_fetch_request(), Some(0xC000));

        apu.dmc_load_sample(0x55);
        assert_eq!(apu.read_status() & 0x10, 0x10);
    }
}
