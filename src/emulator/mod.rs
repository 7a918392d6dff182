// Emulator module - the owning system value that wires everything together
//
// One `Emulator` holds the CPU and the bus (which in turn owns the PPU,
// APU, controllers and the cartridge mapper) and steps them in lockstep:
// every PPU dot is one tick, and every third tick advances the CPU and the
// APU by one CPU cycle. Components never reach into each other directly;
// all cross-talk happens here or over the bus.
//
// Per-dot ordering is fixed: the PPU advances first, a fresh VBlank edge
// latches the NMI, then the CPU runs if its cycle is due, then the APU.

mod config;
mod save_state;

pub use config::{AudioConfig, EmulatorConfig, VideoConfig};
pub use save_state::{SaveState, SaveStateError};

use crate::bus::Bus;
use crate::cartridge::{create_mapper, Cartridge, RomError};
use crate::cpu::Cpu;
use std::fs;
use std::path::{Path, PathBuf};

/// PPU dots per CPU cycle
const PPU_DOTS_PER_CPU_CYCLE: u64 = 3;

/// Base OAM DMA stall; one more on odd CPU cycles
const OAM_DMA_CYCLES: u32 = 513;

/// DMC sample fetches steal this many CPU cycles
const DMC_FETCH_STALL: u32 = 4;

/// The complete console
pub struct Emulator {
    cpu: Cpu,
    bus: Bus,

    /// PPU dots since power-on; drives the 3:1 clock ratio
    master_clock: u64,
    /// CPU cycles still owed for the instruction in flight
    cpu_wait: u8,

    config: EmulatorConfig,
    rom_path: Option<PathBuf>,
    paused: bool,
}

impl Emulator {
    pub fn new() -> Self {
        let config = EmulatorConfig::load_or_default();
        let mut bus = Bus::new();
        bus.apu_mut().set_sample_rate(config.audio.sample_rate);

        Emulator {
            cpu: Cpu::new(),
            bus,
            master_clock: 0,
            cpu_wait: 0,
            config,
            rom_path: None,
            paused: false,
        }
    }

    // ========================================
    // Cartridge lifecycle
    // ========================================

    /// Load a `.nes` file, build its mapper, and reset the system.
    ///
    /// On failure the emulator keeps its previous state.
    pub fn load_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RomError> {
        let path = path.as_ref();
        let cartridge = Cartridge::from_ines_file(path)?;
        log::info!("loaded {}: {}", path.display(), cartridge.info_string());

        let mapper = create_mapper(cartridge)?;
        self.bus.attach_mapper(mapper);
        self.rom_path = Some(path.to_path_buf());
        self.load_battery_ram();
        self.reset();
        Ok(())
    }

    /// Load a cartridge from an in-memory iNES image (tests, embedding)
    pub fn load_rom_bytes(&mut self, data: &[u8]) -> Result<(), RomError> {
        let cartridge = Cartridge::from_ines_bytes(data)?;
        let mapper = create_mapper(cartridge)?;
        self.bus.attach_mapper(mapper);
        self.rom_path = None;
        self.reset();
        Ok(())
    }

    /// Reset button: CPU vector fetch, PPU to the pre-render line, APU
    /// silent. Cartridge contents survive.
    pub fn reset(&mut self) {
        self.bus.ppu_mut().reset();
        self.bus.apu_mut().reset();
        self.bus.input_mut().reset();
        self.cpu.reset(&mut self.bus);
        self.master_clock = 0;
        self.cpu_wait = 0;
        self.paused = false;
    }

    // ========================================
    // Frame stepping
    // ========================================

    /// Run until the next frame boundary at scanline 241, dot 1
    pub fn step_frame(&mut self) {
        loop {
            if self.tick() {
                break;
            }
        }
    }

    /// One PPU dot; returns true when the frame completed on this tick
    pub fn tick(&mut self) -> bool {
        let ppu_tick = self.bus.tick_ppu();

        if ppu_tick.scanline_edge {
            if let Some(mapper) = self.bus.mapper_mut() {
                mapper.step_scanline();
            }
        }
        if ppu_tick.nmi {
            self.cpu.signal_nmi();
        }

        self.master_clock += 1;
        if self.master_clock % PPU_DOTS_PER_CPU_CYCLE == 0 {
            self.tick_cpu_cycle();

            let stall = self.bus.tick_apu();
            if stall > 0 {
                self.cpu.stall_cycles += stall;
                self.cpu.cycles += stall as u64;
            }

            let irq = self.bus.apu().irq_pending()
                || self
                    .bus
                    .mapper()
                    .map(|m| m.irq_pending())
                    .unwrap_or(false);
            self.cpu.set_irq_line(irq);
        }

        ppu_tick.frame_complete
    }

    /// Advance the CPU by one cycle of its current instruction, fetching
    /// the next one when the previous has been fully paid for
    fn tick_cpu_cycle(&mut self) {
        if self.cpu_wait > 0 {
            self.cpu_wait -= 1;
            return;
        }

        let cycles = self.cpu.step(&mut self.bus);
        self.service_oam_dma();
        self.cpu_wait = cycles.saturating_sub(1);
    }

    /// Copy a CPU page into OAM and bill the CPU for the transfer
    fn service_oam_dma(&mut self) {
        let Some(page) = self.bus.take_oam_dma() else {
            return;
        };

        let base = (page as u16) << 8;
        let start = self.bus.ppu().oam_addr();
        for i in 0..256u16 {
            let value = self.bus.read(base + i);
            self.bus
                .ppu_mut()
                .write_oam(start.wrapping_add(i as u8), value);
        }

        let stall = OAM_DMA_CYCLES + (self.cpu.cycles & 1) as u32;
        self.cpu.stall_cycles += stall;
        self.cpu.cycles += stall as u64;
    }

    /// CPU-visible write that also services a triggered OAM DMA; the bus
    /// entry point for hosts and tests
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value);
        self.service_oam_dma();
    }

    /// CPU-visible read
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    // ========================================
    // Host-facing output
    // ========================================

    /// Palette-index frame buffer of the last finished frame
    pub fn frame_buffer(&self) -> &[u8] {
        self.bus.ppu().frame_buffer()
    }

    /// Expand the frame to ABGR8888 into `out`
    pub fn render_rgba(&self, out: &mut [u8]) {
        self.bus.ppu().render_rgba(out);
    }

    /// Drain audio samples produced since the last call
    pub fn take_audio_samples(&mut self, out: &mut Vec<f32>) {
        self.bus.apu_mut().drain_samples(out);
    }

    // ========================================
    // Battery SRAM
    // ========================================

    /// Path of the battery file next to the ROM
    fn sram_path(&self) -> Option<PathBuf> {
        let mapper = self.bus.mapper()?;
        if !mapper.cartridge().has_battery {
            return None;
        }
        Some(self.rom_path.as_ref()?.with_extension("sav"))
    }

    /// Persist PRG-RAM when the cartridge advertises a battery
    pub fn save_battery_ram(&self) -> std::io::Result<()> {
        let (Some(path), Some(mapper)) = (self.sram_path(), self.bus.mapper()) else {
            return Ok(());
        };
        fs::write(path, &mapper.cartridge().prg_ram)
    }

    fn load_battery_ram(&mut self) {
        let Some(path) = self.sram_path() else {
            return;
        };
        let Ok(data) = fs::read(&path) else {
            return;
        };
        if let Some(mapper) = self.bus.mapper_mut() {
            let prg_ram = &mut mapper.cartridge_mut().prg_ram;
            if data.len() == prg_ram.len() {
                prg_ram.copy_from_slice(&data);
                log::info!("restored battery RAM from {}", path.display());
            } else {
                log::warn!("battery file {} has the wrong size", path.display());
            }
        }
    }

    // ========================================
    // Save states
    // ========================================

    /// Snapshot the whole system into a save state
    pub fn save_state(&self) -> Result<SaveState, SaveStateError> {
        SaveState::capture(self)
    }

    /// Restore a snapshot; rejected wholesale on version or mapper
    /// mismatch, leaving the current state untouched
    pub fn load_state(&mut self, state: &SaveState) -> Result<(), SaveStateError> {
        state.restore(self)
    }

    /// Save to a numbered slot next to the ROM
    pub fn save_state_to_slot(&self, slot: u8) -> Result<(), SaveStateError> {
        self.save_state()?
            .write_to_file(slot, self.rom_path.as_deref())
    }

    /// Load from a numbered slot next to the ROM
    pub fn load_state_from_slot(&mut self, slot: u8) -> Result<(), SaveStateError> {
        let state = SaveState::read_from_file(slot, self.rom_path.as_deref())?;
        self.load_state(&state)
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn rom_path(&self) -> Option<&Path> {
        self.rom_path.as_deref()
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// One PPU dot against the installed mapper
    pub(crate) fn tick_ppu(&mut self) -> crate::ppu::PpuTick {
        match self.mapper.as_mut() {
            Some(mapper) => self.ppu.step(mapper.as_mut()),
            None => crate::ppu::PpuTick::default(),
        }
    }

    /// One APU CPU-cycle, servicing any DMC fetch it raises.
    /// Returns the CPU stall cycles incurred.
    pub(crate) fn tick_apu(&mut self) -> u32 {
        self.apu.step();

        if let Some(addr) = self.apu.dmc_fetch_request() {
            let value = match self.mapper.as_ref() {
                Some(mapper) => mapper.cpu_read(addr),
                None => 0,
            };
            self.apu.dmc_load_sample(value);
            return DMC_FETCH_STALL;
        }
        0
    }
}
