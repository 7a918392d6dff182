// Mapper 7 (AxROM) - 32KB PRG switching with single-screen mirroring
//
// Memory Layout:
// - CPU $8000-$FFFF: one switchable 32KB PRG-ROM window
// - PPU $0000-$1FFF: 8KB CHR (usually RAM)
//
// Writes to $8000-$FFFF: bits 0-2 select the 32KB bank, bit 4 selects
// which single nametable screen is used.

use crate::cartridge::mappers::mask_bank;
use crate::cartridge::{Cartridge, Mapper, MapperState, Mirroring, PRG_RAM_SIZE};

/// PRG window size (32KB)
const PRG_WINDOW: usize = 32 * 1024;

/// Mapper 7 implementation (AxROM)
///
/// Used by Battletoads, Wizards & Warriors and Solar Jetman.
pub struct Mapper7 {
    cart: Cartridge,
    prg_bank: u8,
    mirror_high: bool,
}

impl Mapper7 {
    pub fn new(cart: Cartridge) -> Self {
        Mapper7 {
            cart,
            prg_bank: 0,
            mirror_high: false,
        }
    }
}

impl Mapper for Mapper7 {
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.cart.prg_ram[(addr as usize - 0x6000) % PRG_RAM_SIZE],
            0x8000..=0xFFFF => {
                let windows = self.cart.prg_rom.len() / PRG_WINDOW;
                let bank = mask_bank(self.prg_bank as usize, windows.max(1));
                let offset = bank * PRG_WINDOW + (addr & 0x7FFF) as usize;
                self.cart.prg_rom[offset % self.cart.prg_rom.len()]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                self.cart.prg_ram[(addr as usize - 0x6000) % PRG_RAM_SIZE] = value;
            }
            0x8000..=0xFFFF => {
                self.prg_bank = value & 0x07;
                self.mirror_high = value & 0x10 != 0;
            }
            _ => {}
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        self.cart.chr[(addr as usize) % self.cart.chr.len()]
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if self.cart.chr_is_ram {
            let len = self.cart.chr.len();
            self.cart.chr[(addr as usize) % len] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        if self.mirror_high {
            Mirroring::SingleHigh
        } else {
            Mirroring::SingleLow
        }
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cart
    }

    fn save_state(&self) -> MapperState {
        MapperState::Axrom {
            prg_bank: self.prg_bank,
            mirror_high: self.mirror_high,
        }
    }

    fn restore_state(&mut self, state: &MapperState) -> bool {
        if let MapperState::Axrom {
            prg_bank,
            mirror_high,
        } = *state
        {
            self.prg_bank = prg_bank;
            self.mirror_high = mirror_high;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::mappers::tests::test_cartridge;

    fn stamped(prg_banks: usize) -> Cartridge {
        let mut cart = test_cartridge(7, prg_banks, 0);
        for window in 0..(cart.prg_rom.len() / PRG_WINDOW) {
            cart.prg_rom[window * PRG_WINDOW] = (window as u8) * 0x10;
        }
        cart
    }

    #[test]
    fn test_32kb_bank_select() {
        let mut mapper = Mapper7::new(stamped(8)); // 4 windows of 32KB
        assert_eq!(mapper.cpu_read(0x8000), 0x00);

        mapper.cpu_write(0x8000, 2);
        assert_eq!(mapper.cpu_read(0x8000), 0x20);
    }

    #[test]
    fn test_single_screen_select() {
        let mut mapper = Mapper7::new(stamped(4));
        assert_eq!(mapper.mirroring(), Mirroring::SingleLow);

        mapper.cpu_write(0x8000, 0x10);
        assert_eq!(mapper.mirroring(), Mirroring::SingleHigh);

        mapper.cpu_write(0x8000, 0x00);
        assert_eq!(mapper.mirroring(), Mirroring::SingleLow);
    }

    #[test]
    fn test_bank_masked_to_window_count() {
        let mut mapper = Mapper7::new(stamped(4)); // 2 windows
        mapper.cpu_write(0x8000, 0x07);
        assert_eq!(mapper.cpu_read(0x8000), 0x10);
    }
}
