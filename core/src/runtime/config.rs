//! Runtime configuration

use std::time::Duration;

use hotloop_shared::DEFAULT_UPDATE_HZ;

/// Frame scheduler settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Target frame rate in Hz
    pub update_hz: u32,
    /// Whether the coarse part of the frame remainder may be slept off
    pub granular_sleep: bool,
}

impl RuntimeConfig {
    pub fn target_frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.update_hz.max(1) as f64)
    }

    pub fn target_seconds_per_frame(&self) -> f32 {
        1.0 / self.update_hz.max(1) as f32
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            update_hz: DEFAULT_UPDATE_HZ,
            granular_sleep: true,
        }
    }
}
