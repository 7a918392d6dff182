// Mapper 4 (MMC3) - 8KB PRG windows, 2KB/1KB CHR windows, scanline IRQ
//
// Memory Layout (PRG mode 0):
// - CPU $8000-$9FFF: switchable 8KB bank (R6)
// - CPU $A000-$BFFF: switchable 8KB bank (R7)
// - CPU $C000-$DFFF: fixed to second-to-last 8KB bank
// - CPU $E000-$FFFF: fixed to last 8KB bank
// PRG mode 1 swaps the $8000 and $C000 windows.
//
// CHR is six windows: two 2KB (R0, R1) plus four 1KB (R2-R5), with the 2KB
// and 1KB halves swapped when CHR mode is set.
//
// Register pairs are selected by address range and A0:
//   $8000/$8001 bank select / bank data
//   $A000/$A001 mirroring / PRG-RAM protect
//   $C000/$C001 IRQ latch / IRQ reload
//   $E000/$E001 IRQ disable+ack / IRQ enable
//
// The IRQ counter is clocked once per rendered scanline while rendering is
// enabled; on reaching zero with IRQs enabled the CPU IRQ line is held low
// until acknowledged via $E000.

use crate::cartridge::mappers::mask_bank;
use crate::cartridge::{Cartridge, Mapper, MapperState, Mirroring, PRG_RAM_SIZE};

/// PRG window size (8KB)
const PRG_WINDOW: usize = 8 * 1024;

/// CHR window granularity (1KB)
const CHR_WINDOW: usize = 1024;

/// Mapper 4 implementation (MMC3)
///
/// Used by Super Mario Bros. 2/3, Kirby's Adventure and Mega Man 3-6.
pub struct Mapper4 {
    cart: Cartridge,

    /// R0-R7 bank registers
    registers: [u8; 8],
    /// Last value written to $8000
    bank_select: u8,
    /// Mirroring bit from $A000 (0 = vertical, 1 = horizontal)
    mirroring_bit: u8,
    /// $A001 PRG-RAM protect register (write-enable / chip-enable bits)
    prg_ram_protect: u8,

    /// IRQ reload value ($C000)
    irq_latch: u8,
    /// Scanline down-counter
    irq_counter: u8,
    /// Reload requested via $C001
    irq_reload_pending: bool,
    /// IRQ generation enabled ($E001 / $E000)
    irq_enabled: bool,
    /// CPU IRQ line state
    irq_asserted: bool,
}

impl Mapper4 {
    pub fn new(cart: Cartridge) -> Self {
        Mapper4 {
            cart,
            registers: [0; 8],
            bank_select: 0,
            mirroring_bit: 0,
            prg_ram_protect: 0,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload_pending: false,
            irq_enabled: false,
            irq_asserted: false,
        }
    }

    fn prg_mode(&self) -> u8 {
        (self.bank_select >> 6) & 1
    }

    fn chr_mode(&self) -> u8 {
        (self.bank_select >> 7) & 1
    }

    /// Number of 8KB PRG windows on the cartridge
    fn prg_window_count(&self) -> usize {
        self.cart.prg_rom.len() / PRG_WINDOW
    }

    /// Map a CPU address to a PRG-ROM offset
    fn prg_offset(&self, addr: u16) -> usize {
        let count = self.prg_window_count();
        let r6 = self.registers[6] as usize;
        let r7 = self.registers[7] as usize;

        let bank = match (addr, self.prg_mode()) {
            (0x8000..=0x9FFF, 0) => r6,
            (0x8000..=0x9FFF, _) => count - 2,
            (0xA000..=0xBFFF, _) => r7,
            (0xC000..=0xDFFF, 0) => count - 2,
            (0xC000..=0xDFFF, _) => r6,
            _ => count - 1,
        };

        mask_bank(bank, count) * PRG_WINDOW + (addr & 0x1FFF) as usize
    }

    /// Map a PPU address to a CHR offset
    fn chr_offset(&self, addr: u16) -> usize {
        let count = self.cart.chr.len() / CHR_WINDOW;
        // Window index 0-7 in 1KB units; CHR mode 1 swaps the halves
        let window = (addr as usize / CHR_WINDOW) ^ if self.chr_mode() == 1 { 4 } else { 0 };

        let bank = match window {
            0 => (self.registers[0] & 0xFE) as usize,
            1 => (self.registers[0] | 0x01) as usize,
            2 => (self.registers[1] & 0xFE) as usize,
            3 => (self.registers[1] | 0x01) as usize,
            n => self.registers[n - 2] as usize,
        };

        mask_bank(bank, count) * CHR_WINDOW + (addr as usize & 0x03FF)
    }

    fn prg_ram_enabled(&self) -> bool {
        // $A001 bit 7: chip enable
        self.prg_ram_protect & 0x80 != 0 || self.prg_ram_protect == 0
    }

    fn prg_ram_write_enabled(&self) -> bool {
        // $A001 bit 6: write protect
        self.prg_ram_enabled() && self.prg_ram_protect & 0x40 == 0
    }
}

impl Mapper for Mapper4 {
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled() {
                    self.cart.prg_ram[(addr as usize - 0x6000) % PRG_RAM_SIZE]
                } else {
                    0
                }
            }
            0x8000..=0xFFFF => {
                let offset = self.prg_offset(addr);
                self.cart.prg_rom[offset % self.cart.prg_rom.len()]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match (addr, addr & 1) {
            (0x6000..=0x7FFF, _) => {
                if self.prg_ram_write_enabled() {
                    self.cart.prg_ram[(addr as usize - 0x6000) % PRG_RAM_SIZE] = value;
                }
            }
            (0x8000..=0x9FFF, 0) => self.bank_select = value,
            (0x8000..=0x9FFF, _) => {
                self.registers[(self.bank_select & 0x07) as usize] = value;
            }
            (0xA000..=0xBFFF, 0) => self.mirroring_bit = value & 1,
            (0xA000..=0xBFFF, _) => self.prg_ram_protect = value,
            (0xC000..=0xDFFF, 0) => self.irq_latch = value,
            (0xC000..=0xDFFF, _) => self.irq_reload_pending = true,
            (0xE000..=0xFFFF, 0) => {
                self.irq_enabled = false;
                self.irq_asserted = false;
            }
            (0xE000..=0xFFFF, _) => self.irq_enabled = true,
            _ => {}
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        let offset = self.chr_offset(addr);
        self.cart.chr[offset % self.cart.chr.len()]
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if self.cart.chr_is_ram {
            let len = self.cart.chr.len();
            let offset = self.chr_offset(addr);
            self.cart.chr[offset % len] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        if self.cart.mirroring == Mirroring::FourScreen {
            // Hard-wired on four-screen boards; $A000 has no effect
            Mirroring::FourScreen
        } else if self.mirroring_bit & 1 != 0 {
            Mirroring::Horizontal
        } else {
            Mirroring::Vertical
        }
    }

    fn step_scanline(&mut self) {
        if self.irq_reload_pending || self.irq_counter == 0 {
            self.irq_counter = self.irq_latch;
            self.irq_reload_pending = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_asserted = true;
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_asserted
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cart
    }

    fn save_state(&self) -> MapperState {
        MapperState::Mmc3 {
            registers: self.registers,
            bank_select: self.bank_select,
            mirroring_bit: self.mirroring_bit,
            prg_ram_protect: self.prg_ram_protect,
            irq_latch: self.irq_latch,
            irq_counter: self.irq_counter,
            irq_reload_pending: self.irq_reload_pending,
            irq_enabled: self.irq_enabled,
            irq_asserted: self.irq_asserted,
        }
    }

    fn restore_state(&mut self, state: &MapperState) -> bool {
        if let MapperState::Mmc3 {
            registers,
            bank_select,
            mirroring_bit,
            prg_ram_protect,
            irq_latch,
            irq_counter,
            irq_reload_pending,
            irq_enabled,
            irq_asserted,
        } = *state
        {
            self.registers = registers;
            self.bank_select = bank_select;
            self.mirroring_bit = mirroring_bit;
            self.prg_ram_protect = prg_ram_protect;
            self.irq_latch = irq_latch;
            self.irq_counter = irq_counter;
            self.irq_reload_pending = irq_reload_pending;
            self.irq_enabled = irq_enabled;
            self.irq_asserted = irq_asserted;
            true
        } else {
            false
        }
    }
}
