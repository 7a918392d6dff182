// Bus module - CPU address decode and device wiring
//
// The bus owns every memory-mapped device the CPU can see: internal RAM,
// the PPU register file, the APU, both controller ports and the cartridge
// mapper. The CPU itself lives outside; the system driver hands the bus to
// `Cpu::step` one instruction at a time.
//
// # CPU Address Map
//
// | Range        | Target                                          |
// |--------------|-------------------------------------------------|
// | $0000-$1FFF  | 2KB internal RAM, mirrored every $0800          |
// | $2000-$3FFF  | PPU registers, mirrored every 8 bytes           |
// | $4000-$4013  | APU channel registers                           |
// | $4014        | OAM DMA trigger (write only)                    |
// | $4015        | APU status / channel enables                    |
// | $4016        | Controller 1 data / strobe for both pads        |
// | $4017        | Controller 2 data / APU frame counter           |
// | $4018-$401F  | Open bus                                        |
// | $4020-$FFFF  | Cartridge (PRG-RAM, mapper registers, PRG-ROM)  |
//
// Open-bus reads return $00; writes to undecoded space are dropped.

use crate::apu::Apu;
use crate::cartridge::Mapper;
use crate::input::InputPort;
use crate::ppu::Ppu;

/// Internal RAM size (2KB)
const RAM_SIZE: usize = 2048;

/// RAM mirror mask for $0000-$1FFF
const RAM_MIRROR_MASK: u16 = 0x07FF;

/// Memory bus connecting the CPU to every other component
pub struct Bus {
    /// 2KB internal RAM; reads of untouched cells return $00
    ram: [u8; RAM_SIZE],
    pub(crate) ppu: Ppu,
    pub(crate) apu: Apu,
    pub(crate) input: InputPort,
    pub(crate) mapper: Option<Box<dyn Mapper>>,

    /// Page latched by a $4014 write, serviced by the system driver
    oam_dma_page: Option<u8>,
}

impl Bus {
    pub fn new() -> Self {
        Bus {
            ram: [0; RAM_SIZE],
            ppu: Ppu::new(),
            apu: Apu::new(),
            input: InputPort::new(),
            mapper: None,
            oam_dma_page: None,
        }
    }

    /// Install the cartridge mapper and push its mirroring into the PPU
    pub fn attach_mapper(&mut self, mapper: Box<dyn Mapper>) {
        self.ppu.set_mirroring(mapper.mirroring());
        self.mapper = Some(mapper);
    }

    pub fn mapper(&self) -> Option<&dyn Mapper> {
        self.mapper.as_deref()
    }

    pub fn mapper_mut(&mut self) -> Option<&mut Box<dyn Mapper>> {
        self.mapper.as_mut()
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    pub fn apu_mut(&mut self) -> &mut Apu {
        &mut self.apu
    }

    pub fn input_mut(&mut self) -> &mut InputPort {
        &mut self.input
    }

    /// RAM contents for save states
    pub fn ram_contents(&self) -> &[u8] {
        &self.ram
    }

    pub fn restore_ram_contents(&mut self, data: &[u8]) {
        self.ram.copy_from_slice(data);
    }

    /// A pending OAM DMA page, taken once per trigger
    pub fn take_oam_dma(&mut self) -> Option<u8> {
        self.oam_dma_page.take()
    }

    /// Read a byte as the CPU sees it
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & RAM_MIRROR_MASK) as usize],
            0x2000..=0x3FFF => match self.mapper.as_mut() {
                Some(mapper) => self.ppu.read_register(addr, mapper.as_mut()),
                None => 0,
            },
            0x4015 => self.apu.read_status(),
            0x4016 => self.input.read(0),
            0x4017 => self.input.read(1),
            0x4000..=0x401F => 0,
            0x4020..=0xFFFF => match self.mapper.as_ref() {
                Some(mapper) => mapper.cpu_read(addr),
                None => 0,
            },
        }
    }

    /// Write a byte as the CPU sees it
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & RAM_MIRROR_MASK) as usize] = value,
            0x2000..=0x3FFF => {
                if let Some(mapper) = self.mapper.as_mut() {
                    self.ppu.write_register(addr, value, mapper.as_mut());
                }
            }
            0x4014 => self.oam_dma_page = Some(value),
            0x4016 => self.input.write_strobe(value),
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_register(addr, value),
            0x4018..=0x401F => {}
            0x4020..=0xFFFF => {
                if let Some(mapper) = self.mapper.as_mut() {
                    mapper.cpu_write(addr, value);
                    // Mapper register writes may retarget the nametables
                    self.ppu.set_mirroring(mapper.mirroring());
                }
            }
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
