// Shared helpers for integration tests
//
// Tests assemble iNES images in memory instead of shipping ROM files.
#![allow(dead_code)]

use famicore::Emulator;

/// 16KB PRG bank size
pub const PRG_BANK: usize = 16 * 1024;

/// 8KB CHR bank size
pub const CHR_BANK: usize = 8 * 1024;

/// Assemble an iNES image from raw parts
///
/// `prg` is copied to the start of PRG-ROM; the rest is zero-filled to
/// `prg_banks` 16KB banks. The reset vector in the last bank points at
/// `reset`.
pub fn ines_image(mapper_id: u8, prg_banks: u8, chr_banks: u8, prg: &[u8], reset: u16) -> Vec<u8> {
    let mut image = vec![0u8; 16];
    image[0..4].copy_from_slice(b"NES\x1A");
    image[4] = prg_banks;
    image[5] = chr_banks;
    image[6] = (mapper_id & 0x0F) << 4;
    image[7] = mapper_id & 0xF0;

    let prg_size = prg_banks as usize * PRG_BANK;
    image.resize(16 + prg_size + chr_banks as usize * CHR_BANK, 0);

    image[16..16 + prg.len()].copy_from_slice(prg);

    // Vectors live in the last 6 bytes of PRG-ROM
    let vectors = 16 + prg_size - 4;
    image[vectors] = (reset & 0xFF) as u8;
    image[vectors + 1] = (reset >> 8) as u8;
    image
}

/// NROM cartridge with `program` at $8000 and reset vector $8000
pub fn nrom_with_program(program: &[u8]) -> Vec<u8> {
    ines_image(0, 1, 1, program, 0x8000)
}

/// Emulator with `program` loaded and reset
pub fn emulator_with_program(program: &[u8]) -> Emulator {
    let mut emu = Emulator::new();
    emu.load_rom_bytes(&nrom_with_program(program)).unwrap();
    emu
}

/// Run whole frames
pub fn run_frames(emu: &mut Emulator, frames: usize) {
    for _ in 0..frames {
        emu.step_frame();
    }
}
