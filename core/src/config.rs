//! Host configuration (config.toml)
//!
//! Every field carries a serde default, so an empty or partial file yields a
//! runnable configuration. Settings live in the platform config directory
//! unless the launcher is pointed at another file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use hotloop_shared::{
    DEFAULT_ARENA_BASE, DEFAULT_BUFFER_SECONDS, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    DEFAULT_PERMANENT_SIZE, DEFAULT_SAMPLES_PER_SECOND, DEFAULT_TRANSIENT_SIZE, DEFAULT_UPDATE_HZ,
    REPLAY_SLOT_COUNT,
};
use serde::{Deserialize, Serialize};

use crate::arena::ArenaLayout;
use crate::audio::SoundOutput;
use crate::code_host::CodePaths;
use crate::runtime::RuntimeConfig;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HostConfig {
    #[serde(default)]
    pub runtime: RuntimeSection,
    #[serde(default)]
    pub memory: MemorySection,
    #[serde(default)]
    pub audio: AudioSection,
    #[serde(default)]
    pub video: VideoSection,
    #[serde(default)]
    pub code: CodeSection,
    #[serde(default)]
    pub replay: ReplaySection,
    #[serde(default)]
    pub files: FilesSection,
}

/// Frame scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSection {
    /// Frames per second (default: 30)
    #[serde(default = "default_update_hz")]
    pub update_hz: u32,
    /// Sleep off the coarse remainder of each frame before spinning (default: true)
    #[serde(default = "default_true")]
    pub granular_sleep: bool,
}

/// Arena layout, in bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySection {
    #[serde(default = "default_base")]
    pub base: u64,
    #[serde(default = "default_permanent_size")]
    pub permanent_size: u64,
    #[serde(default = "default_transient_size")]
    pub transient_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSection {
    #[serde(default = "default_samples_per_second")]
    pub samples_per_second: u32,
    /// Ring buffer length in seconds (default: 1)
    #[serde(default = "default_buffer_seconds")]
    pub buffer_seconds: u32,
    /// Write cursor lead of the simulated device (default: 16ms)
    #[serde(default = "default_simulated_latency_ms")]
    pub simulated_latency_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSection {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSection {
    /// Module the build writes to (default: logic.wasm)
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Copy the host actually loads (default: logic_temp.wasm)
    #[serde(default = "default_temp")]
    pub temp: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySection {
    /// Where slot mirrors and input logs are kept (default: replays)
    #[serde(default = "default_replay_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_slots")]
    pub slots: usize,
    /// Slot the toggle command records into (default: 1)
    #[serde(default = "default_toggle_slot")]
    pub toggle_slot: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesSection {
    /// Root that logic-module file paths resolve against (default: data)
    #[serde(default = "default_files_root")]
    pub root: PathBuf,
}

fn default_true() -> bool {
    true
}
fn default_update_hz() -> u32 {
    DEFAULT_UPDATE_HZ
}
fn default_base() -> u64 {
    DEFAULT_ARENA_BASE
}
fn default_permanent_size() -> u64 {
    DEFAULT_PERMANENT_SIZE
}
fn default_transient_size() -> u64 {
    DEFAULT_TRANSIENT_SIZE
}
fn default_samples_per_second() -> u32 {
    DEFAULT_SAMPLES_PER_SECOND
}
fn default_buffer_seconds() -> u32 {
    DEFAULT_BUFFER_SECONDS
}
fn default_simulated_latency_ms() -> u32 {
    16
}
fn default_width() -> u32 {
    DEFAULT_FRAME_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_FRAME_HEIGHT
}
fn default_source() -> PathBuf {
    PathBuf::from("logic.wasm")
}
fn default_temp() -> PathBuf {
    PathBuf::from("logic_temp.wasm")
}
fn default_replay_directory() -> PathBuf {
    PathBuf::from("replays")
}
fn default_slots() -> usize {
    REPLAY_SLOT_COUNT
}
fn default_toggle_slot() -> usize {
    1
}
fn default_files_root() -> PathBuf {
    PathBuf::from("data")
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            update_hz: default_update_hz(),
            granular_sleep: default_true(),
        }
    }
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            base: default_base(),
            permanent_size: default_permanent_size(),
            transient_size: default_transient_size(),
        }
    }
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            samples_per_second: default_samples_per_second(),
            buffer_seconds: default_buffer_seconds(),
            simulated_latency_ms: default_simulated_latency_ms(),
        }
    }
}

impl Default for VideoSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for CodeSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            temp: default_temp(),
        }
    }
}

impl Default for ReplaySection {
    fn default() -> Self {
        Self {
            directory: default_replay_directory(),
            slots: default_slots(),
            toggle_slot: default_toggle_slot(),
        }
    }
}

impl Default for FilesSection {
    fn default() -> Self {
        Self {
            root: default_files_root(),
        }
    }
}

impl HostConfig {
    /// Reject settings the runtime cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.runtime.update_hz == 0 {
            bail!("runtime.update_hz must be at least 1");
        }
        if self.audio.samples_per_second == 0 {
            bail!("audio.samples_per_second must be at least 1");
        }
        let ring = SoundOutput::ring_size(self.audio.samples_per_second, self.audio.buffer_seconds);
        if ring.is_none() {
            bail!(
                "audio ring of {} Hz x {} s does not fit in 4 GiB",
                self.audio.samples_per_second,
                self.audio.buffer_seconds
            );
        }
        if self.video.width == 0 || self.video.height == 0 {
            bail!(
                "video size {}x{} must be non-zero",
                self.video.width,
                self.video.height
            );
        }
        if self.replay.toggle_slot == 0 || self.replay.toggle_slot > self.replay.slots {
            bail!(
                "replay.toggle_slot {} is outside 1..={}",
                self.replay.toggle_slot,
                self.replay.slots
            );
        }
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            update_hz: self.runtime.update_hz,
            granular_sleep: self.runtime.granular_sleep,
        }
    }

    pub fn arena_layout(&self) -> Result<ArenaLayout> {
        ArenaLayout::new(
            self.memory.base,
            self.memory.permanent_size,
            self.memory.transient_size,
        )
    }

    pub fn sound_output(&self) -> SoundOutput {
        SoundOutput::new(
            self.audio.samples_per_second,
            self.audio.buffer_seconds,
            self.runtime.update_hz,
        )
    }

    /// Simulated write-cursor lead, aligned to a stereo pair.
    pub fn simulated_latency_bytes(&self) -> u32 {
        let output = self.sound_output();
        let bytes = output.bytes_per_second() as u64 * self.audio.simulated_latency_ms as u64 / 1000;
        output.align(bytes.min(output.buffer_size as u64) as u32)
    }

    pub fn code_paths(&self) -> CodePaths {
        CodePaths {
            source: self.code.source.clone(),
            temp: self.code.temp.clone(),
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/hotloop`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "hotloop", "hotloop")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Load a configuration file.
///
/// A missing file yields the defaults; a file that exists but does not
/// parse is an error.
pub fn load(path: &Path) -> Result<HostConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(HostConfig::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read config {}", path.display()));
        }
    };
    let config: HostConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from the platform config directory, or defaults.
pub fn load_default() -> Result<HostConfig> {
    match config_dir() {
        Some(dir) => load(&dir.join(CONFIG_FILE_NAME)),
        None => Ok(HostConfig::default()),
    }
}
