// PPU test suite, split by concern

mod rendering;

use crate::cartridge::mappers::tests::test_cartridge;
use crate::cartridge::{create_mapper, Mapper};
use crate::ppu::Ppu;

/// PPU plus a CHR-RAM NROM mapper, so tests can write pattern data
pub(crate) fn ppu_with_mapper() -> (Ppu, Box<dyn Mapper>) {
    let cart = test_cartridge(0, 1, 0);
    (Ppu::new(), create_mapper(cart).unwrap())
}

/// Step the PPU until it sits at (scanline, dot)
pub(crate) fn step_to(ppu: &mut Ppu, mapper: &mut dyn Mapper, scanline: u16, dot: u16) {
    while !(ppu.scanline == scanline && ppu.dot == dot) {
        ppu.step(mapper);
    }
}
