//! Frame scheduler tests

use super::*;
use crate::audio::SimulatedDevice;
use crate::config::HostConfig;
use crate::replay::ReplayState;
use crate::test_utils::{
    OWN_MEMORY_LOGIC, ScriptedHooks, TEST_DEVICE_LATENCY, counter_logic, read_permanent_i32,
    test_runtime, write_logic,
};

fn permanent_i32(runtime: &Runtime<SimulatedDevice>, offset: usize) -> i32 {
    let code = runtime.code();
    read_permanent_i32(code.arena_bytes(), code.layout(), offset)
}

fn run_frames(runtime: &mut Runtime<SimulatedDevice>, hooks: &mut ScriptedHooks, count: usize) {
    for _ in 0..count {
        runtime.run_frame(hooks);
    }
}

// ============================================================================
// Frame composition
// ============================================================================

#[test]
fn test_each_frame_runs_logic_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = test_runtime(dir.path(), &counter_logic(1));
    let mut hooks = ScriptedHooks::default();

    run_frames(&mut runtime, &mut hooks, 5);

    assert_eq!(permanent_i32(&runtime, 4), 5);
    assert_eq!(runtime.stats().frames, 5);
    assert_eq!(hooks.presented, 5);
}

#[test]
fn test_held_key_carries_over_frames() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = test_runtime(dir.path(), &counter_logic(1));
    let mut hooks = ScriptedHooks {
        press_face_down_at: Some(1),
        ..Default::default()
    };

    run_frames(&mut runtime, &mut hooks, 4);

    // Pressed on frame 1 and never released
    assert_eq!(permanent_i32(&runtime, 8), 3);
    let key = runtime.last_input().keyboard().buttons[7];
    assert!(key.is_down());
    assert_eq!(key.half_transition_count, 0);
}

#[test]
fn test_frame_is_paced_to_target() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = test_runtime(dir.path(), &counter_logic(1));
    let mut hooks = ScriptedHooks::default();

    let timing = runtime.run_frame(&mut hooks);
    assert!(timing.total >= runtime.config().target_frame_duration() || timing.missed);
}

// ============================================================================
// Host commands
// ============================================================================

#[test]
fn test_pause_skips_update() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = test_runtime(dir.path(), &counter_logic(1));
    let mut hooks = ScriptedHooks {
        commands: vec![(2, HostCommand::TogglePause), (5, HostCommand::TogglePause)],
        ..Default::default()
    };

    run_frames(&mut runtime, &mut hooks, 5);
    assert!(runtime.is_paused());
    assert_eq!(permanent_i32(&runtime, 4), 2);
    assert_eq!(runtime.stats().frames, 5);

    run_frames(&mut runtime, &mut hooks, 2);
    assert!(!runtime.is_paused());
    assert_eq!(permanent_i32(&runtime, 4), 4);
}

#[test]
fn test_quit_ends_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = test_runtime(dir.path(), &counter_logic(1));
    let mut hooks = ScriptedHooks {
        commands: vec![(3, HostCommand::Quit)],
        ..Default::default()
    };

    runtime.run(&mut hooks);

    assert!(runtime.quit_requested());
    assert_eq!(runtime.stats().frames, 4);
}

#[test]
fn test_toggle_replay_records_then_loops() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = test_runtime(dir.path(), &counter_logic(2));
    let mut hooks = ScriptedHooks {
        mouse_step: 7,
        commands: vec![(0, HostCommand::ToggleReplay), (3, HostCommand::ToggleReplay)],
        ..Default::default()
    };

    let mut recorded = Vec::new();
    for _ in 0..3 {
        runtime.run_frame(&mut hooks);
        recorded.push(permanent_i32(&runtime, 0));
    }
    assert_eq!(runtime.replay().state(), ReplayState::Recording { slot: 1 });
    assert_eq!(runtime.replay().frames_recorded(), 3);

    // Playback restores the start state and replays the logged mouse input
    for expected in &recorded {
        runtime.run_frame(&mut hooks);
        assert_eq!(permanent_i32(&runtime, 0), *expected);
    }
    assert_eq!(runtime.replay().state(), ReplayState::Playing { slot: 1 });
    assert_eq!(permanent_i32(&runtime, 4), 3);

    // Log exhausted: restore again and continue from the first record
    runtime.run_frame(&mut hooks);
    assert_eq!(permanent_i32(&runtime, 0), recorded[0]);
    assert_eq!(permanent_i32(&runtime, 4), 1);
    assert_eq!(runtime.replay().loops_completed(), 1);
}

// ============================================================================
// Audio step
// ============================================================================

#[test]
fn test_audio_written_ahead_of_write_cursor() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = test_runtime(dir.path(), &counter_logic(3));
    let mut hooks = ScriptedHooks::default();

    runtime.run_frame(&mut hooks);

    let audio = runtime.audio();
    assert!(audio.sound_is_valid());
    let pairs = audio.running_sample_index() - (TEST_DEVICE_LATENCY / 4) as u64;
    assert!(pairs > 0);

    let start = TEST_DEVICE_LATENCY as usize;
    let end = start + pairs as usize * 4;
    let written = &runtime.device().buffer()[start..end];
    assert!(written.chunks(2).all(|s| i16::from_le_bytes([s[0], s[1]]) == 3));
    assert!(runtime.device().buffer()[end..].iter().all(|&b| b == 0));
}

#[test]
fn test_unresolved_logic_runs_silent() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = test_runtime(dir.path(), OWN_MEMORY_LOGIC);
    let mut hooks = ScriptedHooks::default();
    assert!(!runtime.code().is_valid());

    run_frames(&mut runtime, &mut hooks, 3);

    assert_eq!(hooks.presented, 3);
    assert!(runtime.audio().sound_is_valid());
    // Start-up clear plus the first frame's write
    assert_eq!(runtime.device().lock_count(), 2);
    assert!(runtime.device().buffer().iter().all(|&b| b == 0));
}

#[test]
fn test_device_query_failure_skips_audio() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = test_runtime(dir.path(), &counter_logic(1));
    let mut hooks = ScriptedHooks::default();
    runtime.device_mut().fail_queries(2);

    run_frames(&mut runtime, &mut hooks, 2);
    assert!(!runtime.audio().sound_is_valid());
    assert_eq!(permanent_i32(&runtime, 4), 2);

    runtime.run_frame(&mut hooks);
    assert!(runtime.audio().sound_is_valid());
}

// ============================================================================
// Construction from config
// ============================================================================

#[test]
fn test_from_config_loads_logic() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = HostConfig::default();
    config.runtime.update_hz = 500;
    config.runtime.granular_sleep = false;
    config.memory.base = 1024;
    config.memory.permanent_size = 32 * 1024;
    config.memory.transient_size = 32 * 1024;
    config.code.source = dir.path().join("logic.wasm");
    config.code.temp = dir.path().join("logic_temp.wasm");
    config.replay.directory = dir.path().join("replays");
    config.files.root = dir.path().to_path_buf();
    write_logic(&config.code.source, &counter_logic(1));

    let output = config.sound_output();
    let device = SimulatedDevice::manual(output.buffer_size, output.bytes_per_sample, 1600);
    let mut runtime = Runtime::from_config(&config, device).unwrap();
    assert!(runtime.code().is_valid());
    assert!(runtime.device().is_playing());
    assert_eq!(runtime.replay().slot_count(), 4);

    run_frames(&mut runtime, &mut ScriptedHooks::default(), 2);
    assert_eq!(permanent_i32(&runtime, 4), 2);
}
