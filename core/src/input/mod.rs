//! Per-frame input model
//!
//! An [`InputFrame`] is a plain `#[repr(C)]` image: it is what the logic
//! module queries through the host imports, and it is written byte-for-byte
//! into replay logs. Two frames exist at any time, see [`InputBuffers`].

mod processing;


use bytemuck::{Pod, Zeroable};

pub use processing::{
    InputBuffers, STICK_DEADZONE, normalize_stick, process_digital_button, process_key_event,
};

/// Number of controllers. Controller 0 is the keyboard.
pub const CONTROLLER_COUNT: usize = 5;

/// Index of the keyboard controller.
pub const KEYBOARD_CONTROLLER: usize = 0;

/// Buttons per controller.
pub const BUTTON_COUNT: usize = 10;

/// Tracked mouse buttons (left, right, middle, x1, x2).
pub const MOUSE_BUTTON_COUNT: usize = 5;

/// State of one digital button over a frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ButtonState {
    /// Press and release edges seen during the frame.
    pub half_transition_count: u32,
    /// 1 if the button was down when the frame ended.
    pub ended_down: u32,
}

impl ButtonState {
    pub fn is_down(&self) -> bool {
        self.ended_down != 0
    }

    pub fn set_down(&mut self, down: bool) {
        self.ended_down = down as u32;
    }

    /// True if the button went down at least once this frame.
    pub fn was_pressed(&self) -> bool {
        self.half_transition_count > 1
            || (self.half_transition_count == 1 && self.is_down())
    }
}

/// Controller buttons, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Button {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
    LeftShoulder = 4,
    RightShoulder = 5,
    FaceUp = 6,
    FaceDown = 7,
    FaceLeft = 8,
    FaceRight = 9,
}

impl Button {
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::LeftShoulder,
        Button::RightShoulder,
        Button::FaceUp,
        Button::FaceDown,
        Button::FaceLeft,
        Button::FaceRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// One controller's state for a frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ControllerInput {
    /// 1 if the stick axes carry analog data.
    pub is_analog: u32,
    /// Normalized -1.0..=1.0, zero inside the deadzone.
    pub stick_x: f32,
    pub stick_y: f32,
    pub buttons: [ButtonState; BUTTON_COUNT],
}

impl ControllerInput {
    pub fn button(&self, button: Button) -> &ButtonState {
        &self.buttons[button.index()]
    }

    pub fn button_mut(&mut self, button: Button) -> &mut ButtonState {
        &mut self.buttons[button.index()]
    }
}

/// Complete input for one frame. Also the replay log record.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct InputFrame {
    pub mouse_buttons: [ButtonState; MOUSE_BUTTON_COUNT],
    pub mouse_x: i32,
    pub mouse_y: i32,
    pub mouse_z: i32,
    pub controllers: [ControllerInput; CONTROLLER_COUNT],
}

/// Size of one replay log record.
pub const INPUT_FRAME_SIZE: usize = std::mem::size_of::<InputFrame>();

const _: () = assert!(INPUT_FRAME_SIZE == 512);

impl InputFrame {
    pub fn controller(&self, index: usize) -> Option<&ControllerInput> {
        self.controllers.get(index)
    }

    pub fn controller_mut(&mut self, index: usize) -> Option<&mut ControllerInput> {
        self.controllers.get_mut(index)
    }

    pub fn keyboard(&self) -> &ControllerInput {
        &self.controllers[KEYBOARD_CONTROLLER]
    }

    pub fn keyboard_mut(&mut self) -> &mut ControllerInput {
        &mut self.controllers[KEYBOARD_CONTROLLER]
    }

    /// Raw record bytes, as written to a replay log.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
