//! hotloop - headless frame loop launcher
//!
//! Runs a logic module under the hot-reloading runtime without a window.
//! Rebuild the module while it runs and the next frame picks it up.
//!
//! # Usage
//!
//! ```bash
//! hotloop
//! hotloop --logic target/wasm32-unknown-unknown/release/game.wasm
//! hotloop --config hotloop.toml --frames 300 --toggle-replay-at 60 --toggle-replay-at 120
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use hotloop_core::config::{self, HostConfig};
use hotloop_core::{
    FrameBuffer, HostCommand, InputFrame, PlatformHooks, Runtime, SimulatedDevice, SoundDevice,
};

#[derive(Parser)]
#[command(name = "hotloop")]
#[command(author, version, about = "Hot-reloading frame loop with record/replay")]
struct Args {
    /// Configuration file (default: config.toml in the platform config directory)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Logic module to watch, overriding code.source
    #[arg(long, short = 'l')]
    logic: Option<PathBuf>,

    /// Stop after this many frames (default: run until interrupted)
    #[arg(long, short = 'n')]
    frames: Option<u64>,

    /// Send the replay toggle on these frames (repeatable)
    #[arg(long = "toggle-replay-at")]
    toggle_replay_at: Vec<u64>,

    /// Use the simulated sound device even when cpal is available
    #[arg(long)]
    simulated_audio: bool,
}

/// Platform hooks with no window: scripted commands, checksum on present.
struct HeadlessHooks {
    frame: u64,
    max_frames: Option<u64>,
    toggle_replay_at: Vec<u64>,
}

impl PlatformHooks for HeadlessHooks {
    fn process_input(
        &mut self,
        _previous: &InputFrame,
        _current: &mut InputFrame,
        commands: &mut Vec<HostCommand>,
    ) {
        if self.toggle_replay_at.contains(&self.frame) {
            commands.push(HostCommand::ToggleReplay);
        }
        if self.max_frames.is_some_and(|max| self.frame + 1 >= max) {
            commands.push(HostCommand::Quit);
        }
        self.frame += 1;
    }

    fn present(&mut self, frame: &FrameBuffer) {
        if tracing::enabled!(tracing::Level::TRACE) {
            let sum = frame
                .bytes()
                .iter()
                .fold(0u32, |acc, &b| acc.wrapping_mul(31).wrapping_add(b as u32));
            tracing::trace!(frame = self.frame, checksum = sum, "Presented");
        }
    }
}

fn run_with<D: SoundDevice>(config: &HostConfig, device: D, hooks: &mut HeadlessHooks) -> Result<()> {
    let mut runtime = Runtime::from_config(config, device)?;
    runtime.run(hooks);
    if runtime.missed_frames() > 0 {
        tracing::warn!(missed = runtime.missed_frames(), "Frames missed their deadline");
    }
    Ok(())
}

fn simulated_device(config: &HostConfig) -> SimulatedDevice {
    let output = config.sound_output();
    SimulatedDevice::realtime(
        output.buffer_size,
        output.bytes_per_second(),
        output.bytes_per_sample,
        config.simulated_latency_bytes(),
    )
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut host_config = match &args.config {
        Some(path) => config::load(path)?,
        None => config::load_default().context("Failed to load default config")?,
    };
    if let Some(logic) = args.logic {
        host_config.code.temp = logic.with_extension("hotloop.wasm");
        host_config.code.source = logic;
    }
    host_config.validate()?;

    tracing::info!(
        "Watching {} (loaded from {})",
        host_config.code.source.display(),
        host_config.code.temp.display()
    );

    let mut hooks = HeadlessHooks {
        frame: 0,
        max_frames: args.frames,
        toggle_replay_at: args.toggle_replay_at,
    };

    #[cfg(feature = "cpal")]
    if !args.simulated_audio {
        let output = host_config.sound_output();
        match hotloop_core::CpalDevice::new(output.samples_per_second, output.buffer_size) {
            Ok(device) => return run_with(&host_config, device, &mut hooks),
            Err(e) => tracing::warn!("{}; falling back to simulated audio", e),
        }
    }
    #[cfg(not(feature = "cpal"))]
    if !args.simulated_audio {
        tracing::debug!("Built without cpal; using simulated audio");
    }

    let device = simulated_device(&host_config);
    run_with(&host_config, device, &mut hooks)
}
