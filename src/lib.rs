// famicore - NES emulator core
//
// Instruction-stepped 6502, dot-stepped PPU, full five-channel APU, and
// mappers 0/1/2/3/4/7, driven in lockstep at three PPU dots per CPU cycle.

pub mod apu;
pub mod audio;
pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod display;
pub mod emulator;
pub mod input;
pub mod ppu;

pub use apu::Apu;
pub use bus::Bus;
pub use cartridge::{Cartridge, Mirroring, RomError};
pub use cpu::Cpu;
pub use emulator::Emulator;
pub use input::{Button, Controller, InputPort};
pub use ppu::Ppu;
