//! Gamepad polling
//!
//! Devices are identified by the stable index the host assigns on connect.
//! The host exposes current device state through a [`GamepadSource`]; the
//! controller manager polls it once per tick while running and every idle
//! interval otherwise.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::consts::{AXIS_DEAD_ZONE, AXIS_LEFT_Y, AXIS_RIGHT_Y};
use crate::sim::state::PlayerSide;

/// Device state at the time of a poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadSnapshot {
    pub index: u32,
    pub id: String,
    pub connected: bool,
    /// Monotonic host timestamp of the last state change
    pub timestamp: f64,
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
}

impl GamepadSnapshot {
    pub fn new(index: u32, id: impl Into<String>) -> Self {
        Self {
            index,
            id: id.into(),
            connected: true,
            timestamp: 0.0,
            buttons: vec![false; 16],
            axes: vec![0.0; 4],
        }
    }

    /// Whether the button in `slot` is held; missing slots read as released
    pub fn pressed(&self, slot: usize) -> bool {
        self.buttons.get(slot).copied().unwrap_or(false)
    }

    /// Axis value in `slot`; missing slots read as centered
    pub fn axis(&self, slot: usize) -> f32 {
        self.axes.get(slot).copied().unwrap_or(0.0)
    }
}

/// Host-side access to connected gamepads
pub trait GamepadSource: Send {
    /// Current state of the device at `index`, or `None` if it is gone
    fn poll(&mut self, index: u32) -> Option<GamepadSnapshot>;
}

/// Gamepad source fed by the host (or a test) through shared handles
#[derive(Debug, Clone, Default)]
pub struct ManualGamepads {
    devices: Arc<Mutex<HashMap<u32, GamepadSnapshot>>>,
}

impl ManualGamepads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a device's state
    pub fn set(&self, snapshot: GamepadSnapshot) {
        self.devices.lock().insert(snapshot.index, snapshot);
    }

    pub fn remove(&self, index: u32) {
        self.devices.lock().remove(&index);
    }

    /// Edit a device in place and advance its timestamp
    pub fn update<F: FnOnce(&mut GamepadSnapshot)>(&self, index: u32, f: F) {
        if let Some(device) = self.devices.lock().get_mut(&index) {
            f(device);
            device.timestamp += 1.0;
        }
    }
}

impl GamepadSource for ManualGamepads {
    fn poll(&mut self, index: u32) -> Option<GamepadSnapshot> {
        self.devices.lock().get(&index).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// A registered gamepad and the side it drives
#[derive(Debug, Clone)]
pub struct Controller {
    pub index: u32,
    pub state: ConnectionState,
    pub side: Option<PlayerSide>,
    last_timestamp: f64,
}

/// Result of polling a registered controller
#[derive(Debug, Clone)]
pub struct Polled {
    pub snapshot: GamepadSnapshot,
    /// The device reported a newer timestamp than the previous poll
    pub updated: bool,
}

impl Controller {
    pub fn new(index: u32, side: Option<PlayerSide>) -> Self {
        Self {
            index,
            state: ConnectionState::Connected,
            side,
            last_timestamp: 0.0,
        }
    }

    pub fn id(&self) -> String {
        format!("g{}", self.index)
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Read the device and record its timestamp
    ///
    /// A device the source no longer knows is marked disconnected and loses
    /// its side.
    pub fn poll(&mut self, source: &mut dyn GamepadSource) -> Option<Polled> {
        let Some(snapshot) = source.poll(self.index) else {
            self.state = ConnectionState::Disconnected;
            self.side = None;
            return None;
        };

        self.state = if snapshot.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        let updated = snapshot.timestamp > self.last_timestamp;
        self.last_timestamp = snapshot.timestamp;
        Some(Polled { snapshot, updated })
    }
}

/// Up/down flags from the left and right stick vertical axes
pub fn movement_from_axes(snapshot: &GamepadSnapshot) -> (bool, bool) {
    let ly = snapshot.axis(AXIS_LEFT_Y);
    let ry = snapshot.axis(AXIS_RIGHT_Y);
    let up = ly < -AXIS_DEAD_ZONE || ry < -AXIS_DEAD_ZONE;
    let down = ly > AXIS_DEAD_ZONE || ry > AXIS_DEAD_ZONE;
    (up, down)
}
