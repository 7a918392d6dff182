// Save states
//
// A snapshot of everything the hardware can observe: CPU registers, full
// PPU state, every APU channel, internal RAM, mapper registers, PRG-RAM
// and CHR-RAM. Restores are all-or-nothing: the version and mapper variant
// are checked before any emulator state is touched.

use crate::apu::channels::{DmcChannel, NoiseChannel, PulseChannel, TriangleChannel};
use crate::apu::components::FrameCounter;
use crate::cartridge::{MapperState, Mirroring};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Current save-state format version; mismatches are rejected
const SAVE_STATE_VERSION: u32 = 1;

/// Errors from snapshotting or restoring
#[derive(Debug)]
pub enum SaveStateError {
    Io(io::Error),
    Serialization(serde_json::Error),
    /// State written by a different format version
    VersionMismatch { expected: u32, found: u32 },
    /// State belongs to a different mapper variant
    MapperMismatch,
    /// No cartridge is installed
    NoRomLoaded,
}

impl std::fmt::Display for SaveStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStateError::Io(e) => write!(f, "I/O error: {}", e),
            SaveStateError::Serialization(e) => write!(f, "serialization error: {}", e),
            SaveStateError::VersionMismatch { expected, found } => {
                write!(f, "save state version {} (expected {})", found, expected)
            }
            SaveStateError::MapperMismatch => {
                write!(f, "save state belongs to a different mapper")
            }
            SaveStateError::NoRomLoaded => write!(f, "no ROM loaded"),
        }
    }
}

impl std::error::Error for SaveStateError {}

impl From<io::Error> for SaveStateError {
    fn from(e: io::Error) -> Self {
        SaveStateError::Io(e)
    }
}

impl From<serde_json::Error> for SaveStateError {
    fn from(e: serde_json::Error) -> Self {
        SaveStateError::Serialization(e)
    }
}

/// Complete system snapshot
#[derive(Serialize, Deserialize)]
pub struct SaveState {
    version: u32,
    timestamp: String,

    cpu: CpuState,
    ppu: PpuState,
    apu: ApuState,
    /// 2KB internal RAM
    ram: Vec<u8>,
    mapper: MapperState,
    /// 8KB PRG-RAM
    prg_ram: Vec<u8>,
    /// CHR-RAM contents, for carts that render from RAM
    chr_ram: Option<Vec<u8>>,

    /// Driver phase: dots elapsed and CPU cycles owed, so the 3:1
    /// interleave resumes exactly where it left off
    master_clock: u64,
    cpu_wait: u8,
}

#[derive(Serialize, Deserialize)]
struct CpuState {
    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    pc: u16,
    status: u8,
    cycles: u64,
    stall_cycles: u32,
    nmi_pending: bool,
    irq_line: bool,
}

#[derive(Serialize, Deserialize)]
struct PpuState {
    ctrl: u8,
    mask: u8,
    status: u8,
    oam_addr: u8,
    v: u16,
    t: u16,
    fine_x: u8,
    w: bool,
    read_buffer: u8,
    vram: Vec<u8>,
    palette_ram: Vec<u8>,
    oam: Vec<u8>,
    mirroring: Mirroring,
    scanline: u16,
    dot: u16,
    frame: u64,
    odd_frame: bool,
}

#[derive(Serialize, Deserialize)]
struct ApuState {
    pulse1: PulseChannel,
    pulse2: PulseChannel,
    triangle: TriangleChannel,
    noise: NoiseChannel,
    dmc: DmcChannel,
    frame_counter: FrameCounter,
    cycle: u64,
}

impl SaveState {
    /// Snapshot the current emulator state
    pub fn capture(emulator: &super::Emulator) -> Result<SaveState, SaveStateError> {
        let cpu = emulator.cpu();
        let bus = emulator.bus();
        let ppu = bus.ppu();
        let apu = bus.apu();
        let mapper = bus.mapper().ok_or(SaveStateError::NoRomLoaded)?;
        let cart = mapper.cartridge();

        Ok(SaveState {
            version: SAVE_STATE_VERSION,
            timestamp: chrono::Local::now().to_rfc3339(),
            cpu: CpuState {
                a: cpu.a,
                x: cpu.x,
                y: cpu.y,
                sp: cpu.sp,
                pc: cpu.pc,
                status: cpu.status,
                cycles: cpu.cycles,
                stall_cycles: cpu.stall_cycles,
                nmi_pending: cpu.nmi_pending,
                irq_line: cpu.irq_line,
            },
            ppu: PpuState {
                ctrl: ppu.ctrl,
                mask: ppu.mask,
                status: ppu.status,
                oam_addr: ppu.oam_addr,
                v: ppu.v,
                t: ppu.t,
                fine_x: ppu.fine_x,
                w: ppu.w,
                read_buffer: ppu.read_buffer,
                vram: ppu.vram.to_vec(),
                palette_ram: ppu.palette_ram.to_vec(),
                oam: ppu.oam.to_vec(),
                mirroring: ppu.mirroring,
                scanline: ppu.scanline,
                dot: ppu.dot,
                frame: ppu.frame,
                odd_frame: ppu.odd_frame,
            },
            apu: ApuState {
                pulse1: apu.pulse1.clone(),
                pulse2: apu.pulse2.clone(),
                triangle: apu.triangle.clone(),
                noise: apu.noise.clone(),
                dmc: apu.dmc.clone(),
                frame_counter: apu.frame_counter.clone(),
                cycle: apu.cycle,
            },
            ram: bus.ram_contents().to_vec(),
            mapper: mapper.save_state(),
            prg_ram: cart.prg_ram.clone(),
            chr_ram: cart.chr_is_ram.then(|| cart.chr.clone()),
            master_clock: emulator.master_clock,
            cpu_wait: emulator.cpu_wait,
        })
    }

    /// Restore this snapshot into the emulator
    pub fn restore(&self, emulator: &mut super::Emulator) -> Result<(), SaveStateError> {
        if self.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::VersionMismatch {
                expected: SAVE_STATE_VERSION,
                found: self.version,
            });
        }

        // Validate against the installed mapper before mutating anything
        {
            let bus = emulator.bus_mut();
            let mapper = bus.mapper_mut().ok_or(SaveStateError::NoRomLoaded)?;
            if !mapper.restore_state(&self.mapper) {
                return Err(SaveStateError::MapperMismatch);
            }
            let cart = mapper.cartridge_mut();
            cart.prg_ram.copy_from_slice(&self.prg_ram);
            if let Some(chr) = &self.chr_ram {
                if cart.chr_is_ram {
                    cart.chr.copy_from_slice(chr);
                }
            }
        }

        let cpu = emulator.cpu_mut();
        cpu.a = self.cpu.a;
        cpu.x = self.cpu.x;
        cpu.y = self.cpu.y;
        cpu.sp = self.cpu.sp;
        cpu.pc = self.cpu.pc;
        cpu.status = self.cpu.status;
        cpu.cycles = self.cpu.cycles;
        cpu.stall_cycles = self.cpu.stall_cycles;
        cpu.nmi_pending = self.cpu.nmi_pending;
        cpu.irq_line = self.cpu.irq_line;

        let bus = emulator.bus_mut();
        bus.restore_ram_contents(&self.ram);

        let ppu = bus.ppu_mut();
        ppu.ctrl = self.ppu.ctrl;
        ppu.mask = self.ppu.mask;
        ppu.status = self.ppu.status;
        ppu.oam_addr = self.ppu.oam_addr;
        ppu.v = self.ppu.v;
        ppu.t = self.ppu.t;
        ppu.fine_x = self.ppu.fine_x;
        ppu.w = self.ppu.w;
        ppu.read_buffer = self.ppu.read_buffer;
        ppu.vram.copy_from_slice(&self.ppu.vram);
        ppu.palette_ram.copy_from_slice(&self.ppu.palette_ram);
        ppu.oam.copy_from_slice(&self.ppu.oam);
        ppu.mirroring = self.ppu.mirroring;
        ppu.scanline = self.ppu.scanline;
        ppu.dot = self.ppu.dot;
        ppu.frame = self.ppu.frame;
        ppu.odd_frame = self.ppu.odd_frame;

        let apu = bus.apu_mut();
        apu.pulse1 = self.apu.pulse1.clone();
        apu.pulse2 = self.apu.pulse2.clone();
        apu.triangle = self.apu.triangle.clone();
        apu.noise = self.apu.noise.clone();
        apu.dmc = self.apu.dmc.clone();
        apu.frame_counter = self.apu.frame_counter.clone();
        apu.cycle = self.apu.cycle;

        emulator.master_clock = self.master_clock;
        emulator.cpu_wait = self.cpu_wait;

        Ok(())
    }

    // ========================================
    // Slot files
    // ========================================

    /// Serialise into a slot file next to the ROM
    pub fn write_to_file(&self, slot: u8, rom_path: Option<&Path>) -> Result<(), SaveStateError> {
        let dir = Self::slot_directory(rom_path);
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string(self)?;
        fs::write(dir.join(format!("slot_{}.state", slot)), json)?;
        Ok(())
    }

    /// Load a slot file written by `write_to_file`
    pub fn read_from_file(slot: u8, rom_path: Option<&Path>) -> Result<SaveState, SaveStateError> {
        let dir = Self::slot_directory(rom_path);
        let json = fs::read_to_string(dir.join(format!("slot_{}.state", slot)))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn slot_directory(rom_path: Option<&Path>) -> PathBuf {
        let base = PathBuf::from("saves");
        match rom_path.and_then(|p| p.file_stem()) {
            Some(stem) => base.join(stem),
            None => base.join("default"),
        }
    }
}
