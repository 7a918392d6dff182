// Mappers module - cartridge bank-switching hardware
//
// Each mapper owns the cartridge it was created from and translates the
// cartridge-facing parts of the CPU and PPU address spaces into offsets in
// the cartridge's PRG/CHR/PRG-RAM arrays. Only CPU addresses >= $6000 and
// PPU addresses < $2000 (pattern tables) are routed here.
//
// Mirroring is authoritative on the mapper: register writes that change the
// mirror arrangement are visible through `mirroring()` immediately, and the
// bus pushes the new mode into the PPU after every cartridge-space write.

mod mapper0;
mod mapper1;
mod mapper2;
mod mapper3;
mod mapper4;
mod mapper7;

pub use mapper0::Mapper0;
pub use mapper1::Mapper1;
pub use mapper2::Mapper2;
pub use mapper3::Mapper3;
pub use mapper4::Mapper4;
pub use mapper7::Mapper7;

use super::{Cartridge, Mirroring, RomError};
use serde::{Deserialize, Serialize};

/// Common interface over all supported bank-switching variants
pub trait Mapper {
    /// Read from the CPU side ($6000-$FFFF routed here)
    fn cpu_read(&self, addr: u16) -> u8;

    /// Write to the CPU side; writes at $8000+ hit mapper registers
    fn cpu_write(&mut self, addr: u16, value: u8);

    /// Read from the PPU pattern-table space ($0000-$1FFF)
    fn ppu_read(&self, addr: u16) -> u8;

    /// Write to the PPU pattern-table space (CHR-RAM carts only)
    fn ppu_write(&mut self, addr: u16, value: u8);

    /// Current nametable mirroring arrangement
    fn mirroring(&self) -> Mirroring;

    /// Clock the scanline counter (MMC3 IRQ); called once per rendered
    /// scanline while rendering is enabled
    fn step_scanline(&mut self) {}

    /// Whether the mapper is holding the CPU IRQ line low
    fn irq_pending(&self) -> bool {
        false
    }

    /// Shared view of the cartridge this mapper owns
    fn cartridge(&self) -> &Cartridge;

    /// Mutable view of the cartridge (battery SRAM restore)
    fn cartridge_mut(&mut self) -> &mut Cartridge;

    /// Snapshot the mapper's register state for a save state
    fn save_state(&self) -> MapperState;

    /// Restore register state; returns false if the snapshot belongs to a
    /// different mapper variant
    fn restore_state(&mut self, state: &MapperState) -> bool;
}

/// Serialisable register state, one variant per supported mapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MapperState {
    Nrom,
    Mmc1 {
        shift: u8,
        shift_count: u8,
        control: u8,
        chr_bank_0: u8,
        chr_bank_1: u8,
        prg_bank: u8,
        prg_ram_disabled: bool,
    },
    Uxrom {
        prg_bank: u8,
    },
    Cnrom {
        chr_bank: u8,
    },
    Mmc3 {
        registers: [u8; 8],
        bank_select: u8,
        mirroring_bit: u8,
        prg_ram_protect: u8,
        irq_latch: u8,
        irq_counter: u8,
        irq_reload_pending: bool,
        irq_enabled: bool,
        irq_asserted: bool,
    },
    Axrom {
        prg_bank: u8,
        mirror_high: bool,
    },
}

/// Create the mapper matching the cartridge's header id
///
/// The mapper takes ownership of the cartridge. An id outside the supported
/// set {0, 1, 2, 3, 4, 7} is rejected with `RomError::UnsupportedMapper`.
pub fn create_mapper(cartridge: Cartridge) -> Result<Box<dyn Mapper>, RomError> {
    match cartridge.mapper_id {
        0 => Ok(Box::new(Mapper0::new(cartridge))),
        1 => Ok(Box::new(Mapper1::new(cartridge))),
        2 => Ok(Box::new(Mapper2::new(cartridge))),
        3 => Ok(Box::new(Mapper3::new(cartridge))),
        4 => Ok(Box::new(Mapper4::new(cartridge))),
        7 => Ok(Box::new(Mapper7::new(cartridge))),
        n => Err(RomError::UnsupportedMapper(n)),
    }
}

/// Mask a bank index to a bank count: power-of-two counts mask, others wrap
#[inline]
pub(crate) fn mask_bank(bank: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else if count.is_power_of_two() {
        bank & (count - 1)
    } else {
        bank % count
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cartridge::{CHR_BANK_SIZE, PRG_BANK_SIZE};

    /// Helper to build a cartridge with the given geometry
    pub(crate) fn test_cartridge(mapper_id: u8, prg_banks: usize, chr_banks: usize) -> Cartridge {
        let chr_is_ram = chr_banks == 0;
        Cartridge {
            mapper_id,
            prg_banks,
            chr_banks,
            mirroring: Mirroring::Horizontal,
            has_battery: false,
            has_trainer: false,
            is_pal: false,
            crc32: 0,
            prg_rom: vec![0; prg_banks * PRG_BANK_SIZE],
            chr: vec![0; chr_banks.max(1) * CHR_BANK_SIZE],
            chr_is_ram,
            prg_ram: vec![0; crate::cartridge::PRG_RAM_SIZE],
        }
    }

    #[test]
    fn test_factory_supported_set() {
        for id in [0u8, 1, 2, 3, 4, 7] {
            let cart = test_cartridge(id, 2, 1);
            assert!(create_mapper(cart).is_ok(), "mapper {} should build", id);
        }
    }

    #[test]
    fn test_factory_rejects_unknown() {
        let cart = test_cartridge(99, 2, 1);
        assert!(matches!(
            create_mapper(cart),
            Err(RomError::UnsupportedMapper(99))
        ));
    }

    #[test]
    fn test_mask_bank() {
        assert_eq!(mask_bank(5, 4), 1); // power of two
        assert_eq!(mask_bank(7, 3), 1); // modulo fallback
        assert_eq!(mask_bank(3, 0), 0);
    }
}
