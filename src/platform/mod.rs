//! Platform abstraction layer
//!
//! Host-facing input plumbing:
//! - Keyboard and pointer/touch affordances
//! - Gamepad registry and polling

pub mod gamepad;
pub mod input;

pub use gamepad::{Controller, GamepadSnapshot, GamepadSource, ManualGamepads};
pub use input::{Affordance, ControlAction, ControllerManager, InputEvent};
