//! Input unification
//!
//! Keyboard, pointer/touch affordances and gamepads are all reduced to the
//! same [`ControlAction`]s. Host callbacks may run on any thread: they push
//! [`InputEvent`]s through a channel and the game drains it at the start of
//! each tick, so paddle state is only ever written on the simulation thread.

use std::collections::{BTreeMap, BTreeSet};

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::gamepad::{ConnectionState, Controller, GamepadSource, movement_from_axes};
use crate::consts::{BUTTON_NEW_GAME, BUTTON_PAUSE};
use crate::sim::state::{GamePhase, MoveIntent, PlayerSide};

/// On-screen press-and-hold controls, labelled like their keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    DarkUp,
    DarkDown,
    LightUp,
    LightDown,
}

impl Affordance {
    /// Parse an affordance label (`W`, `S`, `O`, `L`)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "w" => Some(Affordance::DarkUp),
            "s" => Some(Affordance::DarkDown),
            "o" => Some(Affordance::LightUp),
            "l" => Some(Affordance::LightDown),
            _ => None,
        }
    }

    pub fn side(self) -> PlayerSide {
        match self {
            Affordance::DarkUp | Affordance::DarkDown => PlayerSide::Dark,
            Affordance::LightUp | Affordance::LightDown => PlayerSide::Light,
        }
    }

    /// Intent while the affordance is held
    fn pressed(self) -> MoveIntent {
        let up = matches!(self, Affordance::DarkUp | Affordance::LightUp);
        MoveIntent::new(self.side(), up, !up)
    }

    /// Intent once released: the whole paddle stops
    fn released(self) -> MoveIntent {
        MoveIntent::new(self.side(), false, false)
    }
}

/// Raw input as delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    PointerDown(Affordance),
    PointerUp(Affordance),
    PointerLeave(Affordance),
    TouchStart(Affordance),
    TouchEnd(Affordance),
    GamepadConnected { index: u32, id: String },
    GamepadDisconnected { index: u32 },
}

/// What the game should do in response to input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    NewGame,
    TogglePause,
    ToggleDebugGrid,
    Move(MoveIntent),
}

/// Tracks held keys and registered gamepads
pub struct ControllerManager {
    keys: BTreeSet<String>,
    controllers: BTreeMap<u32, Controller>,
    gamepad_enabled: bool,
    source: Option<Box<dyn GamepadSource>>,
    tx: Sender<InputEvent>,
    rx: Receiver<InputEvent>,
}

impl ControllerManager {
    pub fn new(gamepad_enabled: bool, source: Option<Box<dyn GamepadSource>>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            keys: BTreeSet::new(),
            controllers: BTreeMap::new(),
            gamepad_enabled,
            source,
            tx,
            rx,
        }
    }

    /// Handle for host callbacks to queue input from other threads
    pub fn sender(&self) -> Sender<InputEvent> {
        self.tx.clone()
    }

    /// Take every queued input event
    pub fn drain(&self) -> Vec<InputEvent> {
        self.rx.try_iter().collect()
    }

    pub fn gamepad_enabled(&self) -> bool {
        self.gamepad_enabled
    }

    pub fn controller(&self, index: u32) -> Option<&Controller> {
        self.controllers.get(&index)
    }

    pub fn controllers(&self) -> impl Iterator<Item = &Controller> {
        self.controllers.values()
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Translate one input event into actions
    pub fn handle(&mut self, event: InputEvent) -> Vec<ControlAction> {
        match event {
            InputEvent::KeyDown(key) => {
                let key = key.to_lowercase();
                let mut actions = Vec::new();
                match key.as_str() {
                    "n" => actions.push(ControlAction::NewGame),
                    "p" => actions.push(ControlAction::TogglePause),
                    "g" => actions.push(ControlAction::ToggleDebugGrid),
                    _ => {}
                }
                self.keys.insert(key);
                actions.extend(self.key_movement());
                actions
            }
            InputEvent::KeyUp(key) => {
                self.keys.remove(&key.to_lowercase());
                self.key_movement().to_vec()
            }
            InputEvent::PointerDown(a) | InputEvent::TouchStart(a) => {
                vec![ControlAction::Move(a.pressed())]
            }
            InputEvent::PointerUp(a) | InputEvent::PointerLeave(a) | InputEvent::TouchEnd(a) => {
                vec![ControlAction::Move(a.released())]
            }
            InputEvent::GamepadConnected { index, id } => {
                self.connect_gamepad(index, &id);
                Vec::new()
            }
            InputEvent::GamepadDisconnected { index } => {
                if let Some(controller) = self.controllers.remove(&index) {
                    log::debug!(
                        "gamepad {} disconnected (side {:?})",
                        controller.id(),
                        controller.side
                    );
                }
                Vec::new()
            }
        }
    }

    /// Both paddles from the currently held movement keys
    fn key_movement(&self) -> [ControlAction; 2] {
        let held = |k: &str| self.keys.contains(k);
        [
            ControlAction::Move(MoveIntent::new(PlayerSide::Dark, held("w"), held("s"))),
            ControlAction::Move(MoveIntent::new(PlayerSide::Light, held("o"), held("l"))),
        ]
    }

    fn free_side(&self) -> Option<PlayerSide> {
        PlayerSide::ALL
            .into_iter()
            .find(|side| !self.controllers.values().any(|c| c.side == Some(*side)))
    }

    fn connect_gamepad(&mut self, index: u32, id: &str) {
        if !self.gamepad_enabled {
            return;
        }

        let free = self.free_side();
        if let Some(controller) = self.controllers.get_mut(&index) {
            controller.state = ConnectionState::Connected;
            if controller.side.is_none() {
                controller.side = free;
            }
            log::debug!(
                "gamepad {} reconnected (side {:?})",
                controller.id(),
                controller.side
            );
            return;
        }

        let controller = Controller::new(index, free);
        log::debug!("gamepad {} connected: {id} (side {:?})", controller.id(), controller.side);
        self.controllers.insert(index, controller);
    }

    /// Per-tick gamepad poll while the game is running
    ///
    /// The pause button wins over movement and ends the poll.
    pub fn update(&mut self) -> Vec<ControlAction> {
        let mut actions = Vec::new();
        if !self.gamepad_enabled {
            return actions;
        }
        let Some(source) = self.source.as_deref_mut() else {
            return actions;
        };

        for controller in self.controllers.values_mut() {
            let Some(side) = controller.side else {
                continue;
            };
            let Some(polled) = controller.poll(source) else {
                continue;
            };
            if !controller.is_connected() || !polled.updated {
                continue;
            }
            if polled.snapshot.pressed(BUTTON_PAUSE) {
                actions.push(ControlAction::TogglePause);
                return actions;
            }
            let (up, down) = movement_from_axes(&polled.snapshot);
            actions.push(ControlAction::Move(MoveIntent::new(side, up, down)));
        }
        actions
    }

    /// Gamepad poll while the game is not running
    ///
    /// New game is only honored here so a stray press cannot restart a rally.
    pub fn poll_idle(&mut self, phase: GamePhase) -> Option<ControlAction> {
        if phase == GamePhase::Running || !self.gamepad_enabled {
            return None;
        }
        let source = self.source.as_deref_mut()?;

        for controller in self.controllers.values_mut() {
            if controller.side.is_none() {
                continue;
            }
            let Some(polled) = controller.poll(source) else {
                continue;
            };
            if !controller.is_connected() || !polled.updated {
                continue;
            }
            if polled.snapshot.pressed(BUTTON_PAUSE) {
                return Some(ControlAction::TogglePause);
            }
            if polled.snapshot.pressed(BUTTON_NEW_GAME) {
                return Some(ControlAction::NewGame);
            }
        }
        None
    }

    /// Forget held keys; registered gamepads stay
    pub fn reset(&mut self) {
        self.keys.clear();
    }

    /// Drop all controller state and queued input
    pub fn destroy(&mut self) {
        self.keys.clear();
        self.controllers.clear();
        self.rx.try_iter().for_each(drop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::AXIS_LEFT_Y;
    use crate::platform::gamepad::{GamepadSnapshot, ManualGamepads};

    fn moves(actions: &[ControlAction]) -> Vec<MoveIntent> {
        actions
            .iter()
            .filter_map(|a| match a {
                ControlAction::Move(intent) => Some(*intent),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_discrete_keys() {
        let mut manager = ControllerManager::new(false, None);
        let actions = manager.handle(InputEvent::KeyDown("N".into()));
        assert_eq!(actions[0], ControlAction::NewGame);
        let actions = manager.handle(InputEvent::KeyDown("p".into()));
        assert_eq!(actions[0], ControlAction::TogglePause);
        let actions = manager.handle(InputEvent::KeyDown("g".into()));
        assert_eq!(actions[0], ControlAction::ToggleDebugGrid);
    }

    #[test]
    fn test_movement_keys_track_held_set() {
        let mut manager = ControllerManager::new(false, None);
        let actions = manager.handle(InputEvent::KeyDown("W".into()));
        assert_eq!(
            moves(&actions),
            vec![
                MoveIntent::new(PlayerSide::Dark, true, false),
                MoveIntent::new(PlayerSide::Light, false, false),
            ]
        );

        manager.handle(InputEvent::KeyDown("l".into()));
        let actions = manager.handle(InputEvent::KeyUp("w".into()));
        assert_eq!(
            moves(&actions),
            vec![
                MoveIntent::new(PlayerSide::Dark, false, false),
                MoveIntent::new(PlayerSide::Light, false, true),
            ]
        );
    }

    #[test]
    fn test_both_keys_held() {
        let mut manager = ControllerManager::new(false, None);
        manager.handle(InputEvent::KeyDown("w".into()));
        let actions = manager.handle(InputEvent::KeyDown("s".into()));
        assert_eq!(moves(&actions)[0], MoveIntent::new(PlayerSide::Dark, true, true));
    }

    #[test]
    fn test_affordances() {
        let mut manager = ControllerManager::new(false, None);
        let light_up = Affordance::from_label("O").unwrap();
        assert_eq!(
            manager.handle(InputEvent::TouchStart(light_up)),
            vec![ControlAction::Move(MoveIntent::new(PlayerSide::Light, true, false))]
        );
        assert_eq!(
            manager.handle(InputEvent::PointerLeave(light_up)),
            vec![ControlAction::Move(MoveIntent::new(PlayerSide::Light, false, false))]
        );
        let dark_down = Affordance::from_label("s").unwrap();
        assert_eq!(
            manager.handle(InputEvent::PointerDown(dark_down)),
            vec![ControlAction::Move(MoveIntent::new(PlayerSide::Dark, false, true))]
        );
        assert_eq!(Affordance::from_label("x"), None);
    }

    #[test]
    fn test_gamepad_side_assignment() {
        let mut manager = ControllerManager::new(true, None);
        for index in 0..3 {
            manager.handle(InputEvent::GamepadConnected { index, id: "pad".into() });
        }
        assert_eq!(manager.controller(0).unwrap().side, Some(PlayerSide::Dark));
        assert_eq!(manager.controller(1).unwrap().side, Some(PlayerSide::Light));
        assert_eq!(manager.controller(2).unwrap().side, None);

        manager.handle(InputEvent::GamepadDisconnected { index: 0 });
        manager.handle(InputEvent::GamepadConnected { index: 3, id: "pad".into() });
        assert_eq!(manager.controller(3).unwrap().side, Some(PlayerSide::Dark));
    }

    #[test]
    fn test_gamepads_ignored_when_disabled() {
        let mut manager = ControllerManager::new(false, None);
        manager.handle(InputEvent::GamepadConnected { index: 0, id: "pad".into() });
        assert_eq!(manager.controllers().count(), 0);
    }

    #[test]
    fn test_gamepad_update_moves_and_pauses() {
        let pads = ManualGamepads::new();
        pads.set(GamepadSnapshot::new(0, "pad"));
        let mut manager = ControllerManager::new(true, Some(Box::new(pads.clone())));
        manager.handle(InputEvent::GamepadConnected { index: 0, id: "pad".into() });

        // No state change since connect
        assert!(manager.update().is_empty());

        pads.update(0, |p| p.axes[AXIS_LEFT_Y] = -0.8);
        assert_eq!(
            manager.update(),
            vec![ControlAction::Move(MoveIntent::new(PlayerSide::Dark, true, false))]
        );

        pads.update(0, |p| p.buttons[BUTTON_PAUSE] = true);
        assert_eq!(manager.update(), vec![ControlAction::TogglePause]);
    }

    #[test]
    fn test_idle_poll_new_game_only_when_not_running() {
        let pads = ManualGamepads::new();
        pads.set(GamepadSnapshot::new(0, "pad"));
        let mut manager = ControllerManager::new(true, Some(Box::new(pads.clone())));
        manager.handle(InputEvent::GamepadConnected { index: 0, id: "pad".into() });

        pads.update(0, |p| p.buttons[BUTTON_NEW_GAME] = true);
        assert_eq!(manager.poll_idle(GamePhase::Running), None);
        assert_eq!(manager.poll_idle(GamePhase::Over), Some(ControlAction::NewGame));
        // Held button with no newer timestamp is not repeated
        assert_eq!(manager.poll_idle(GamePhase::Over), None);
    }

    #[test]
    fn test_queue_and_destroy() {
        let mut manager = ControllerManager::new(true, None);
        let tx = manager.sender();
        tx.send(InputEvent::KeyDown("w".into())).unwrap();
        tx.send(InputEvent::KeyUp("w".into())).unwrap();
        assert_eq!(manager.drain().len(), 2);

        manager.handle(InputEvent::KeyDown("w".into()));
        manager.handle(InputEvent::GamepadConnected { index: 0, id: "pad".into() });
        tx.send(InputEvent::KeyDown("o".into())).unwrap();
        manager.destroy();
        assert!(!manager.is_held("w"));
        assert_eq!(manager.controllers().count(), 0);
        assert!(manager.drain().is_empty());
    }
}
