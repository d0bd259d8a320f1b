//! Input query FFI functions
//!
//! Out-of-range controller or button indices read as released/zero.

use wasmtime::Caller;

use crate::input::{Button, ButtonState, ControllerInput};
use crate::wasm::HostContext;

fn controller(caller: &Caller<'_, HostContext>, index: u32) -> Option<ControllerInput> {
    caller.data().input.controller(index as usize).copied()
}

fn button(caller: &Caller<'_, HostContext>, index: u32, button: u32) -> Option<ButtonState> {
    let button = Button::from_index(button)?;
    controller(caller, index).map(|c| *c.button(button))
}

/// 1 if the button was down at the end of the frame
pub(super) fn button_ended_down(
    caller: Caller<'_, HostContext>,
    controller: u32,
    index: u32,
) -> u32 {
    button(&caller, controller, index).map_or(0, |b| b.is_down() as u32)
}

/// Number of press/release edges during the frame
pub(super) fn button_half_transitions(
    caller: Caller<'_, HostContext>,
    controller: u32,
    index: u32,
) -> u32 {
    button(&caller, controller, index).map_or(0, |b| b.half_transition_count)
}

pub(super) fn controller_is_analog(caller: Caller<'_, HostContext>, index: u32) -> u32 {
    controller(&caller, index).map_or(0, |c| c.is_analog)
}

pub(super) fn stick_x(caller: Caller<'_, HostContext>, index: u32) -> f32 {
    controller(&caller, index).map_or(0.0, |c| c.stick_x)
}

pub(super) fn stick_y(caller: Caller<'_, HostContext>, index: u32) -> f32 {
    controller(&caller, index).map_or(0.0, |c| c.stick_y)
}

pub(super) fn mouse_x(caller: Caller<'_, HostContext>) -> i32 {
    caller.data().input.mouse_x
}

pub(super) fn mouse_y(caller: Caller<'_, HostContext>) -> i32 {
    caller.data().input.mouse_y
}

pub(super) fn mouse_z(caller: Caller<'_, HostContext>) -> i32 {
    caller.data().input.mouse_z
}

pub(super) fn mouse_button_ended_down(caller: Caller<'_, HostContext>, index: u32) -> u32 {
    caller
        .data()
        .input
        .mouse_buttons
        .get(index as usize)
        .map_or(0, |b| b.is_down() as u32)
}
