// Configuration: user-tweakable settings persisted as TOML

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Configuration file name, looked up in the working directory
const CONFIG_FILE: &str = "famicore.toml";

/// Emulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmulatorConfig {
    pub video: VideoConfig,
    pub audio: AudioConfig,
    /// Directory save-state slots are written under
    pub save_directory: PathBuf,
}

/// Video settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Integer window scale (1-8)
    pub scale: u32,
    pub vsync: bool,
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub enabled: bool,
    /// Output gain (0.0-1.0)
    pub volume: f32,
    pub sample_rate: u32,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            video: VideoConfig {
                scale: 3,
                vsync: true,
            },
            audio: AudioConfig {
                enabled: true,
                volume: 1.0,
                sample_rate: 44_100,
            },
            save_directory: PathBuf::from("saves"),
        }
    }
}

impl EmulatorConfig {
    /// Load the config file, falling back to defaults when absent or
    /// unparseable
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    fn load() -> Option<Self> {
        let contents = fs::read_to_string(CONFIG_FILE).ok()?;
        match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring malformed {}: {}", CONFIG_FILE, e);
                None
            }
        }
    }

    /// Persist the current settings
    pub fn save(&self) -> io::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(CONFIG_FILE, contents)
    }
}
