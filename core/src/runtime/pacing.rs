//! Frame pacing and timing statistics

use std::time::{Duration, Instant};

use super::RuntimeConfig;

/// Timing of one finished frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// Time spent before pacing started.
    pub work: Duration,
    /// Full frame time including sleep and spin.
    pub total: Duration,
    /// The work alone already exceeded the target.
    pub missed: bool,
}

/// Holds each frame to the target duration.
///
/// When time remains, the whole milliseconds are slept (if granular sleep is
/// available) and the rest is spun off against the clock. An overrun frame
/// skips both and is counted as missed.
#[derive(Debug)]
pub struct FramePacer {
    target: Duration,
    granular_sleep: bool,
    frame_start: Instant,
    missed_frames: u64,
}

impl FramePacer {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            target: config.target_frame_duration(),
            granular_sleep: config.granular_sleep,
            frame_start: Instant::now(),
            missed_frames: 0,
        }
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    /// Restart the frame clock now.
    pub fn restart(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Wall time since the current frame started.
    pub fn elapsed(&self) -> Duration {
        self.frame_start.elapsed()
    }

    pub fn missed_frames(&self) -> u64 {
        self.missed_frames
    }

    /// Wait out the rest of the frame and start the next one.
    pub fn wait(&mut self) -> FrameTiming {
        let work = self.elapsed();
        let missed = work >= self.target;
        if missed {
            self.missed_frames += 1;
            tracing::warn!(
                work_ms = work.as_secs_f64() * 1000.0,
                target_ms = self.target.as_secs_f64() * 1000.0,
                missed = self.missed_frames,
                "Missed frame deadline"
            );
        } else {
            if self.granular_sleep {
                let sleep_ms = (self.target - work).as_millis() as u64;
                if sleep_ms > 0 {
                    std::thread::sleep(Duration::from_millis(sleep_ms));
                }
            }
            while self.elapsed() < self.target {
                std::hint::spin_loop();
            }
        }

        let total = self.elapsed();
        self.frame_start = Instant::now();
        FrameTiming {
            work,
            total,
            missed,
        }
    }
}

/// Running frame counters, logged at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameStats {
    pub frames: u64,
    pub missed: u64,
    pub last: Option<FrameTiming>,
}

impl FrameStats {
    pub fn record(&mut self, timing: FrameTiming) {
        self.frames += 1;
        if timing.missed {
            self.missed += 1;
        }
        self.last = Some(timing);

        let seconds = timing.total.as_secs_f64();
        let fps = if seconds > 0.0 { 1.0 / seconds } else { 0.0 };
        tracing::trace!(
            frame = self.frames,
            ms_per_frame = seconds * 1000.0,
            work_ms = timing.work.as_secs_f64() * 1000.0,
            fps,
            "Frame timing"
        );
    }
}
