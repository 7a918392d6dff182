// famicore - host entry point

use anyhow::Context;
use clap::Parser;
use famicore::audio::AudioOutput;
use famicore::display::{run_window, WindowConfig};
use famicore::Emulator;
use std::path::PathBuf;

/// NES emulator
#[derive(Parser)]
#[command(name = "famicore", version, about)]
struct Args {
    /// Path to an iNES ROM image
    rom: PathBuf,

    /// Window scale factor (1-8)
    #[arg(long)]
    scale: Option<u32>,

    /// Disable audio output
    #[arg(long)]
    no_audio: bool,

    /// Disable vsync
    #[arg(long)]
    no_vsync: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut emulator = Emulator::new();
    emulator
        .load_rom(&args.rom)
        .with_context(|| format!("loading {}", args.rom.display()))?;

    let config = emulator.config().clone();
    let window_config = WindowConfig {
        scale: args.scale.unwrap_or(config.video.scale),
        vsync: config.video.vsync && !args.no_vsync,
    };

    let audio = if config.audio.enabled && !args.no_audio {
        match AudioOutput::new(config.audio.sample_rate, config.audio.volume) {
            Ok(output) => Some(output),
            Err(e) => {
                log::warn!("audio disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    run_window(emulator, window_config, audio)
}
