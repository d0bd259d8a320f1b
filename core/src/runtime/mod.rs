//! Frame scheduler
//!
//! [`Runtime`] owns every piece of mutable platform state and drives one
//! fixed-rate frame at a time: reload poll, input, record/playback, the
//! update/render call, the audio step, pacing and present. Windowing and
//! event decoding stay outside behind [`PlatformHooks`].

mod config;
mod pacing;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};

use crate::audio::{AudioSync, SoundDevice, SoundOutput};
use crate::code_host::CodeHost;
use crate::config::HostConfig;
use crate::files::FileServices;
use crate::framebuffer::FrameBuffer;
use crate::input::{InputBuffers, InputFrame};
use crate::replay::ReplayEngine;

pub use config::RuntimeConfig;
pub use pacing::{FramePacer, FrameStats, FrameTiming};

/// Requests the platform collaborator can make between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Advance the replay toggle on the configured slot.
    ToggleReplay,
    TogglePause,
    Quit,
}

/// Window-side collaborator: input translation and presentation.
pub trait PlatformHooks {
    /// Fill `current` from pending platform events.
    ///
    /// `current` arrives rebuilt from `previous`: held buttons, analog flags
    /// and mouse position carried over, sticks and transition counts zeroed.
    fn process_input(
        &mut self,
        previous: &InputFrame,
        current: &mut InputFrame,
        commands: &mut Vec<HostCommand>,
    );

    /// Show the finished frame.
    fn present(&mut self, frame: &FrameBuffer);
}

pub struct Runtime<D: SoundDevice> {
    config: RuntimeConfig,
    code: CodeHost,
    replay: ReplayEngine,
    audio: AudioSync,
    device: D,
    input: InputBuffers,
    pacer: FramePacer,
    stats: FrameStats,
    commands: Vec<HostCommand>,
    toggle_slot: usize,
    paused: bool,
    quit_requested: bool,
}

impl<D: SoundDevice> Runtime<D> {
    /// Assemble a runtime and start the sound device.
    ///
    /// A device that fails to start is logged and left to the per-frame
    /// cursor query, which keeps sound invalid until it recovers.
    pub fn new(
        config: RuntimeConfig,
        code: CodeHost,
        replay: ReplayEngine,
        output: SoundOutput,
        mut device: D,
        toggle_slot: usize,
    ) -> Self {
        let mut audio = AudioSync::new(output);
        if let Err(e) = audio.start(&mut device) {
            tracing::warn!("Sound output unavailable: {}", e);
        }
        Self {
            pacer: FramePacer::new(&config),
            config,
            code,
            replay,
            audio,
            device,
            input: InputBuffers::new(),
            stats: FrameStats::default(),
            commands: Vec::new(),
            toggle_slot,
            paused: false,
            quit_requested: false,
        }
    }

    /// Build every component from a host configuration and load the logic.
    pub fn from_config(host: &HostConfig, device: D) -> Result<Self> {
        host.validate()?;
        let layout = host.arena_layout()?;
        let frame = FrameBuffer::new(host.video.width, host.video.height);
        let files = FileServices::new(&host.files.root);

        let mut code = CodeHost::new(host.code_paths(), layout, frame, files)
            .context("Failed to create code host")?;
        code.load();

        let replay = ReplayEngine::new(
            &host.replay.directory,
            host.replay.slots,
            code.arena_bytes().len(),
        )
        .context("Failed to create replay slots")?;

        tracing::info!(
            update_hz = host.runtime.update_hz,
            arena_bytes = layout.memory_bytes(),
            slots = host.replay.slots,
            "Runtime ready"
        );

        Ok(Self::new(
            host.runtime_config(),
            code,
            replay,
            host.sound_output(),
            device,
            host.replay.toggle_slot,
        ))
    }

    /// Run frames until a `Quit` command arrives.
    pub fn run<H: PlatformHooks>(&mut self, hooks: &mut H) {
        self.pacer.restart();
        while !self.quit_requested {
            self.run_frame(hooks);
        }
        tracing::info!(
            frames = self.stats.frames,
            missed = self.stats.missed,
            "Runtime stopped"
        );
    }

    /// Run exactly one paced frame.
    pub fn run_frame<H: PlatformHooks>(&mut self, hooks: &mut H) -> FrameTiming {
        self.code.reload_if_changed();

        self.input.begin_frame();
        {
            let (previous, current) = self.input.pair_mut();
            hooks.process_input(previous, current, &mut self.commands);
        }
        self.apply_commands();

        if !self.paused {
            self.step_replay();
            self.code.update_and_render(self.input.current());

            let audio_elapsed = self.pacer.elapsed().as_secs_f32();
            self.input.flip();
            self.step_audio(audio_elapsed);
        }

        let timing = self.pacer.wait();
        hooks.present(self.code.frame_buffer());
        self.stats.record(timing);
        timing
    }

    fn apply_commands(&mut self) {
        for command in std::mem::take(&mut self.commands) {
            match command {
                HostCommand::ToggleReplay => {
                    self.replay
                        .toggle(self.toggle_slot, self.code.arena_bytes_mut());
                }
                HostCommand::TogglePause => {
                    self.paused = !self.paused;
                    tracing::info!(paused = self.paused, "Pause toggled");
                }
                HostCommand::Quit => self.quit_requested = true,
            }
        }
    }

    fn step_replay(&mut self) {
        if self.replay.is_recording() {
            self.replay.record_frame(self.input.current());
        }
        if self.replay.is_playing() {
            self.replay
                .play_frame(self.input.current_mut(), self.code.arena_bytes_mut());
        }
    }

    fn step_audio(&mut self, elapsed_seconds: f32) {
        let Some(plan) = self.audio.plan(
            &mut self.device,
            self.config.target_seconds_per_frame(),
            elapsed_seconds,
        ) else {
            return;
        };
        let output = *self.audio.output();
        let samples = self
            .code
            .get_sound_samples(plan.sample_count(&output), output.samples_per_second);
        self.audio.commit(&mut self.device, &plan, samples);
    }

    /// Queue a command as if the platform had sent it.
    pub fn push_command(&mut self, command: HostCommand) {
        self.commands.push(command);
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn code(&self) -> &CodeHost {
        &self.code
    }

    pub fn code_mut(&mut self) -> &mut CodeHost {
        &mut self.code
    }

    pub fn replay(&self) -> &ReplayEngine {
        &self.replay
    }

    pub fn audio(&self) -> &AudioSync {
        &self.audio
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// The input frame most recently handed to the logic module.
    pub fn last_input(&self) -> &InputFrame {
        self.input.previous()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn missed_frames(&self) -> u64 {
        self.pacer.missed_frames()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}
