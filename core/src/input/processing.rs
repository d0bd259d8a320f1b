//! Input processing helpers and the double-buffered frame pair

use super::{ButtonState, ControllerInput, InputFrame};

/// Raw stick magnitude treated as centered (XInput left-thumb deadzone).
pub const STICK_DEADZONE: i16 = 7849;

/// Apply a key-down/key-up event to a button within the frame.
///
/// Only edges count: a repeated "down" while already down changes nothing.
pub fn process_key_event(state: &mut ButtonState, is_down: bool) {
    if state.is_down() != is_down {
        state.set_down(is_down);
        state.half_transition_count += 1;
    }
}

/// Derive a polled digital button from last frame's state.
pub fn process_digital_button(old: &ButtonState, new: &mut ButtonState, is_down: bool) {
    new.set_down(is_down);
    new.half_transition_count = (old.is_down() != is_down) as u32;
}

/// Normalize a raw signed stick value to -1.0..=1.0 with a deadzone.
pub fn normalize_stick(value: i16, deadzone: i16) -> f32 {
    if value < -deadzone {
        value as f32 / 32768.0
    } else if value > deadzone {
        value as f32 / 32767.0
    } else {
        0.0
    }
}

/// Two input frames with an explicit current/previous selector.
///
/// The selector flips once per frame; after the flip the frame just used
/// becomes `previous` and is not written again until it is rebuilt.
#[derive(Debug, Clone, Default)]
pub struct InputBuffers {
    frames: [InputFrame; 2],
    current: usize,
}

impl InputBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &InputFrame {
        &self.frames[self.current]
    }

    pub fn current_mut(&mut self) -> &mut InputFrame {
        &mut self.frames[self.current]
    }

    pub fn previous(&self) -> &InputFrame {
        &self.frames[1 - self.current]
    }

    /// Split borrow: previous frame (read-only) and current frame.
    pub fn pair_mut(&mut self) -> (&InputFrame, &mut InputFrame) {
        let [a, b] = &mut self.frames;
        if self.current == 0 { (&*b, a) } else { (&*a, b) }
    }

    /// Start building the current frame.
    ///
    /// Every field is rebuilt from the previous frame: each controller keeps
    /// its held buttons and analog flag, the mouse keeps its buttons and
    /// position. Sticks and half transitions start at zero. Nothing written
    /// into this buffer two frames ago survives.
    pub fn begin_frame(&mut self) {
        let (previous, current) = self.pair_mut();
        for (old, new) in previous.controllers.iter().zip(current.controllers.iter_mut()) {
            carry_held(old, new);
        }
        for (old, new) in previous.mouse_buttons.iter().zip(current.mouse_buttons.iter_mut()) {
            *new = ButtonState {
                half_transition_count: 0,
                ended_down: old.ended_down,
            };
        }
        current.mouse_x = previous.mouse_x;
        current.mouse_y = previous.mouse_y;
        current.mouse_z = previous.mouse_z;
    }

    /// Swap current and previous.
    pub fn flip(&mut self) {
        self.current = 1 - self.current;
    }
}

fn carry_held(old: &ControllerInput, new: &mut ControllerInput) {
    *new = ControllerInput {
        is_analog: old.is_analog,
        ..Default::default()
    };
    for (old_button, new_button) in old.buttons.iter().zip(new.buttons.iter_mut()) {
        new_button.ended_down = old_button.ended_down;
    }
}
