//! Lookup tables shared by the APU channels

/// Pulse duty sequences: 12.5%, 25%, 50%, 75% (25% inverted)
pub const DUTY_PATTERNS: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

/// Triangle 32-step sequence: 15 down to 0, then back up
pub const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0,
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

/// Length counter load values, indexed by register bits 3-7
pub const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14,
    12, 16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30,
];

/// Noise channel timer periods in CPU cycles (NTSC)
pub const NOISE_PERIODS: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// DMC timer periods in CPU cycles (NTSC)
pub const DMC_PERIODS: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

/// Frame sequencer step boundaries, mode 0 (4-step)
pub const FRAME_STEPS_MODE_0: [u32; 4] = [3729, 7457, 11186, 14915];

/// Frame sequencer step boundaries, mode 1 (5-step; step 4 is silent)
pub const FRAME_STEPS_MODE_1: [u32; 4] = [3729, 7457, 11186, 18641];

/// NTSC CPU clock in Hz
pub const CPU_CLOCK_NTSC: f64 = 1_789_773.0;
