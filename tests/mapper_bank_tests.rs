// Bank switching exercised through the CPU-visible address space

mod common;

use common::{ines_image, PRG_BANK};
use famicore::Emulator;

/// Image whose PRG banks are stamped: first byte of bank N reads N * 0x10
fn stamped_image(mapper_id: u8, prg_banks: u8, chr_banks: u8) -> Vec<u8> {
    let mut image = ines_image(mapper_id, prg_banks, chr_banks, &[], 0x8000);
    for bank in 0..prg_banks as usize {
        image[16 + bank * PRG_BANK] = (bank as u8) * 0x10;
    }
    image
}

#[test]
fn test_uxrom_low_window_switches() {
    let mut emu = Emulator::new();
    emu.load_rom_bytes(&stamped_image(2, 4, 0)).unwrap();

    assert_eq!(emu.cpu_read(0x8000), 0x00);
    assert_eq!(emu.cpu_read(0xC000), 0x30); // fixed last bank

    emu.cpu_write(0x8000, 2);
    assert_eq!(emu.cpu_read(0x8000), 0x20);
    assert_eq!(emu.cpu_read(0xC000), 0x30);
}

#[test]
fn test_mmc1_serial_bank_switch() {
    let mut emu = Emulator::new();
    emu.load_rom_bytes(&stamped_image(1, 4, 1)).unwrap();

    // Power-on: fix-last mode
    assert_eq!(emu.cpu_read(0xC000), 0x30);

    // Select bank 2 for the $8000 window, one bit at a time
    for bit in [0u8, 1, 0, 0, 0] {
        emu.cpu_write(0xE000, bit);
    }
    assert_eq!(emu.cpu_read(0x8000), 0x20);
}

#[test]
fn test_axrom_32kb_switch() {
    let mut emu = Emulator::new();
    emu.load_rom_bytes(&stamped_image(7, 8, 0)).unwrap();

    assert_eq!(emu.cpu_read(0x8000), 0x00);
    emu.cpu_write(0x8000, 1);
    assert_eq!(emu.cpu_read(0x8000), 0x20); // 32KB window = 2 stamps in
}

#[test]
fn test_prg_ram_persists_across_banks() {
    let mut emu = Emulator::new();
    emu.load_rom_bytes(&stamped_image(2, 4, 0)).unwrap();

    emu.cpu_write(0x6000, 0x5A);
    emu.cpu_write(0x8000, 3); // bank switch
    assert_eq!(emu.cpu_read(0x6000), 0x5A);
}

#[test]
fn test_unsupported_mapper_rejected() {
    let image = ines_image(66, 2, 1, &[], 0x8000);
    let mut emu = Emulator::new();
    assert!(emu.load_rom_bytes(&image).is_err());
}

#[test]
fn test_mmc3_prg_layout_through_bus() {
    let mut emu = Emulator::new();
    // 4 x 16KB = 8 x 8KB windows; stamp each 8KB window
    let mut image = ines_image(4, 4, 1, &[], 0x8000);
    for window in 0..8 {
        image[16 + window * 8 * 1024] = window as u8;
    }
    emu.load_rom_bytes(&image).unwrap();

    // Select R6=1 (bank at $8000), R7=2
    emu.cpu_write(0x8000, 6);
    emu.cpu_write(0x8001, 1);
    emu.cpu_write(0x8000, 7);
    emu.cpu_write(0x8001, 2);

    assert_eq!(emu.cpu_read(0x8000), 1);
    assert_eq!(emu.cpu_read(0xA000), 2);
    assert_eq!(emu.cpu_read(0xC000), 6); // second-to-last window
    assert_eq!(emu.cpu_read(0xE000), 7); // last window
}
