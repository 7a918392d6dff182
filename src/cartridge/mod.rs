// Cartridge module - iNES ROM parsing and cartridge memory ownership
//
// A cartridge owns the raw byte arrays shipped on the physical cart:
// PRG-ROM (16KB banks), CHR-ROM or CHR-RAM (8KB banks), and 8KB of PRG-RAM.
// The mapper implementations in `mappers/` translate bus addresses into
// offsets inside these arrays; the cartridge itself never interprets them.
//
// # iNES Header (16 bytes)
//
// | Offset | Meaning                                                     |
// |--------|-------------------------------------------------------------|
// | 0-3    | Magic "NES\x1A"                                             |
// | 4      | PRG-ROM size in 16KB units                                  |
// | 5      | CHR-ROM size in 8KB units (0 = cartridge has CHR-RAM)       |
// | 6      | Flags: mirror, battery, trainer, four-screen, mapper low    |
// | 7      | Flags: VS/PlayChoice, NES 2.0 signature, mapper high        |
// | 10     | Bit 0: PAL cartridge                                        |

pub mod mappers;

pub use mappers::{create_mapper, Mapper, MapperState};

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// PRG-ROM bank size (16KB)
pub const PRG_BANK_SIZE: usize = 16 * 1024;

/// CHR bank size (8KB)
pub const CHR_BANK_SIZE: usize = 8 * 1024;

/// PRG-RAM size (8KB, the standard configuration)
pub const PRG_RAM_SIZE: usize = 8 * 1024;

/// iNES header length
const HEADER_SIZE: usize = 16;

/// Trainer blob length when flags6 bit 2 is set
const TRAINER_SIZE: usize = 512;

/// iNES magic number
const INES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

/// Nametable mirroring arrangement
///
/// Determined by the cartridge header and, for several mappers, changed at
/// runtime by mapper register writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Mirroring {
    /// $2000=$2400 and $2800=$2C00
    Horizontal,
    /// $2000=$2800 and $2400=$2C00
    Vertical,
    /// All four nametables map to the first 1KB
    SingleLow,
    /// All four nametables map to the second 1KB
    SingleHigh,
    /// Cartridge provides extra VRAM for four distinct nametables
    FourScreen,
}

/// Errors surfaced while turning a byte stream into a cartridge
#[derive(Debug)]
pub enum RomError {
    /// Header magic mismatch
    InvalidHeader,
    /// Image shorter than the header-declared PRG/CHR payload
    Truncated,
    /// Mapper id outside the supported set {0, 1, 2, 3, 4, 7}
    UnsupportedMapper(u8),
    /// Buffer allocation failed while loading
    Allocation,
    /// Underlying file I/O failure
    Io(io::Error),
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomError::InvalidHeader => write!(f, "not an iNES image (bad magic)"),
            RomError::Truncated => write!(f, "iNES image truncated"),
            RomError::UnsupportedMapper(n) => write!(f, "mapper {} is not supported", n),
            RomError::Allocation => write!(f, "out of memory while loading ROM"),
            RomError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for RomError {}

impl From<io::Error> for RomError {
    fn from(e: io::Error) -> Self {
        RomError::Io(e)
    }
}

/// A parsed iNES cartridge
///
/// Bytes are immutable after load except for CHR-RAM (when `chr_is_ram`)
/// and PRG-RAM, which the owning mapper writes through.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Cartridge {
    /// Mapper id from the header nibbles
    pub mapper_id: u8,
    /// Number of 16KB PRG-ROM banks
    pub prg_banks: usize,
    /// Number of 8KB CHR-ROM banks (0 means the cart carries CHR-RAM)
    pub chr_banks: usize,
    /// Header mirroring arrangement
    pub mirroring: Mirroring,
    /// Battery-backed PRG-RAM present
    pub has_battery: bool,
    /// 512-byte trainer present before PRG data
    pub has_trainer: bool,
    /// PAL cartridge flag (byte 10 bit 0)
    pub is_pal: bool,
    /// CRC-32 over PRG followed by CHR-ROM
    pub crc32: u32,

    /// PRG-ROM: `prg_banks * 16KB`
    pub prg_rom: Vec<u8>,
    /// CHR-ROM or CHR-RAM: `max(chr_banks, 1) * 8KB`
    pub chr: Vec<u8>,
    /// Whether `chr` is writable RAM
    pub chr_is_ram: bool,
    /// 8KB PRG-RAM at $6000-$7FFF
    pub prg_ram: Vec<u8>,
}

impl Cartridge {
    /// Parse a cartridge from an in-memory iNES byte stream
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < HEADER_SIZE {
            return Err(RomError::Truncated);
        }
        if data[0..4] != INES_MAGIC {
            return Err(RomError::InvalidHeader);
        }

        let prg_banks = data[4] as usize;
        let chr_banks = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];
        let flags10 = data[10];

        let mapper_id = (flags7 & 0xF0) | (flags6 >> 4);
        let has_battery = flags6 & 0x02 != 0;
        let has_trainer = flags6 & 0x04 != 0;
        let is_pal = flags10 & 0x01 != 0;

        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let prg_size = prg_banks * PRG_BANK_SIZE;
        let chr_size = chr_banks * CHR_BANK_SIZE;
        if prg_size == 0 {
            return Err(RomError::InvalidHeader);
        }

        let mut offset = HEADER_SIZE;
        if has_trainer {
            offset += TRAINER_SIZE;
        }
        if data.len() < offset + prg_size + chr_size {
            return Err(RomError::Truncated);
        }

        let prg_rom = try_copy(&data[offset..offset + prg_size])?;
        offset += prg_size;

        let (chr, chr_is_ram) = if chr_banks > 0 {
            (try_copy(&data[offset..offset + chr_size])?, false)
        } else {
            (try_zeroed(CHR_BANK_SIZE)?, true)
        };

        let prg_ram = try_zeroed(PRG_RAM_SIZE)?;

        let mut crc = Crc32::new();
        crc.update(&prg_rom);
        if !chr_is_ram {
            crc.update(&chr);
        }

        Ok(Cartridge {
            mapper_id,
            prg_banks,
            chr_banks,
            mirroring,
            has_battery,
            has_trainer,
            is_pal,
            crc32: crc.finish(),
            prg_rom,
            chr,
            chr_is_ram,
            prg_ram,
        })
    }

    /// Load a cartridge from a `.nes` file on disk
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let data = fs::read(path)?;
        Self::from_ines_bytes(&data)
    }

    /// Serialise the cartridge back into an iNES byte stream
    ///
    /// PRG and CHR-ROM bytes round-trip exactly. The trainer blob is not
    /// retained at load, so images with trainers re-emit without one.
    pub fn to_ines_bytes(&self) -> Vec<u8> {
        let mut header = [0u8; HEADER_SIZE];
        header[0..4].copy_from_slice(&INES_MAGIC);
        header[4] = self.prg_banks as u8;
        header[5] = self.chr_banks as u8;

        let mut flags6 = (self.mapper_id & 0x0F) << 4;
        match self.mirroring {
            Mirroring::Vertical => flags6 |= 0x01,
            Mirroring::FourScreen => flags6 |= 0x08,
            _ => {}
        }
        if self.has_battery {
            flags6 |= 0x02;
        }
        header[6] = flags6;
        header[7] = self.mapper_id & 0xF0;
        if self.is_pal {
            header[10] = 0x01;
        }

        let mut out = Vec::with_capacity(HEADER_SIZE + self.prg_rom.len() + self.chr.len());
        out.extend_from_slice(&header);
        out.extend_from_slice(&self.prg_rom);
        if !self.chr_is_ram {
            out.extend_from_slice(&self.chr);
        }
        out
    }

    /// One-line description for load-time logging
    pub fn info_string(&self) -> String {
        format!(
            "mapper {} | PRG {} x 16KB | CHR {} x 8KB ({}) | {:?} | battery: {} | CRC32 {:08X}",
            self.mapper_id,
            self.prg_banks,
            self.chr_banks.max(1),
            if self.chr_is_ram { "RAM" } else { "ROM" },
            self.mirroring,
            if self.has_battery { "yes" } else { "no" },
            self.crc32,
        )
    }
}

/// Copy a slice into a fresh Vec, surfacing allocation failure
fn try_copy(src: &[u8]) -> Result<Vec<u8>, RomError> {
    let mut v = Vec::new();
    v.try_reserve_exact(src.len()).map_err(|_| RomError::Allocation)?;
    v.extend_from_slice(src);
    Ok(v)
}

/// Allocate a zero-filled Vec, surfacing allocation failure
fn try_zeroed(len: usize) -> Result<Vec<u8>, RomError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| RomError::Allocation)?;
    v.resize(len, 0);
    Ok(v)
}

/// CRC-32 (IEEE reflected polynomial) over the cartridge payload
struct Crc32 {
    table: [u32; 256],
    value: u32,
}

impl Crc32 {
    fn new() -> Self {
        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = i as u32;
            for _ in 0..8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ 0xEDB8_8320
                } else {
                    crc >> 1
                };
            }
            *entry = crc;
        }
        Crc32 { table, value: 0xFFFF_FFFF }
    }

    fn update(&mut self, data: &[u8]) {
        for &b in data {
            let idx = ((self.value ^ b as u32) & 0xFF) as usize;
            self.value = self.table[idx] ^ (self.value >> 8);
        }
    }

    fn finish(&self) -> u32 {
        !self.value
    }
}
