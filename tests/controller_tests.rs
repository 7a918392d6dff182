// Controller protocol end-to-end through the bus

mod common;

use common::emulator_with_program;
use famicore::Button;

#[test]
fn test_strobe_and_read_sequence() {
    let mut emu = emulator_with_program(&[0x4C, 0x00, 0x80]);
    emu.bus_mut().input_mut().set_button(0, Button::A, true);

    emu.cpu_write(0x4016, 0x01);
    emu.cpu_write(0x4016, 0x00);

    let reads: Vec<u8> = (0..8).map(|_| emu.cpu_read(0x4016)).collect();
    assert_eq!(
        reads,
        vec![0x41, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40]
    );
}

#[test]
fn test_sequence_unaffected_by_unrelated_writes() {
    let mut emu = emulator_with_program(&[0x4C, 0x00, 0x80]);
    emu.bus_mut().input_mut().set_button(0, Button::B, true);

    emu.cpu_write(0x4016, 0x01);
    emu.cpu_write(0x4016, 0x00);

    assert_eq!(emu.cpu_read(0x4016), 0x40); // A
    // Writes that do not toggle bit 0 leave the shifter alone
    emu.cpu_write(0x4016, 0x00);
    emu.cpu_write(0x4016, 0xFE);
    assert_eq!(emu.cpu_read(0x4016), 0x41); // B
}

#[test]
fn test_exhausted_reads_return_high() {
    let mut emu = emulator_with_program(&[0x4C, 0x00, 0x80]);
    emu.cpu_write(0x4016, 0x01);
    emu.cpu_write(0x4016, 0x00);

    for _ in 0..8 {
        emu.cpu_read(0x4016);
    }
    assert_eq!(emu.cpu_read(0x4016), 0x41);
}

#[test]
fn test_second_controller_on_4017() {
    let mut emu = emulator_with_program(&[0x4C, 0x00, 0x80]);
    emu.bus_mut().input_mut().set_button(1, Button::Start, true);

    emu.cpu_write(0x4016, 0x01);
    emu.cpu_write(0x4016, 0x00);

    let reads: Vec<u8> = (0..4).map(|_| emu.cpu_read(0x4017)).collect();
    assert_eq!(reads, vec![0x40, 0x40, 0x40, 0x41]);
}
