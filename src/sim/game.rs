//! Game orchestrator
//!
//! Owns the arena, the input unifier, the render sink and the optional relay
//! link, and drives the lifecycle:
//!
//! ```text
//! initial --start--> running --pause--> paused --resume--> running
//! running/paused --stop--> stopped
//! running --loss--> over --start--> running
//! ```
//!
//! Scheduling is external: a host (see [`super::runner::Runner`]) calls
//! [`Game::frame`] at display cadence while a frame is armed and
//! [`Game::poll_idle`] otherwise. Pausing or stopping disarms the frame, so a
//! tick is never interrupted half way.

use std::time::{Instant, SystemTime};

use crossbeam_channel::{Receiver, Sender, unbounded};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::grid::Grid;
use super::state::{Arena, GameConfig, GameEvent, GamePhase, MoveIntent, Paddle, PlayerSide};
use super::tick::step;
use crate::error::{GameError, Result};
use crate::net::link::RelayLink;
use crate::net::protocol::CommandMessage;
use crate::numbers::new_id;
use crate::platform::gamepad::GamepadSource;
use crate::platform::input::{ControlAction, ControllerManager, InputEvent};
use crate::renderer::{RenderSink, draw_arena};

/// Collects construction options for a [`Game`]
#[derive(Default)]
pub struct GameBuilder {
    config: GameConfig,
    sink: Option<Box<dyn RenderSink>>,
    gamepad_enabled: bool,
    gamepad_source: Option<Box<dyn GamepadSource>>,
    link: Option<RelayLink>,
}

impl GameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Surface the game paints on; required
    pub fn render_sink(mut self, sink: impl RenderSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn gamepad_enabled(mut self, enabled: bool) -> Self {
        self.gamepad_enabled = enabled;
        self
    }

    pub fn gamepad_source(mut self, source: impl GamepadSource + 'static) -> Self {
        self.gamepad_source = Some(Box::new(source));
        self
    }

    /// Mirror events to (and take commands from) a relay
    pub fn link(mut self, link: RelayLink) -> Self {
        self.link = Some(link);
        self
    }

    pub fn build(self) -> Result<Game> {
        let sink = self.sink.ok_or(GameError::MissingSurface)?;
        let (width, height) = sink.size();
        if width == 0 || height == 0 {
            return Err(GameError::InvalidSurface { width, height });
        }

        let mut rng = match self.config.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::seed_from_u64(rand::random()),
        };
        let arena = Arena::new(width as f32, height as f32, &self.config, &mut rng);
        let id = new_id(&mut rng, SystemTime::now());
        log::debug!("game {id} created on a {width}x{height} surface");

        Ok(Game {
            id,
            config: self.config,
            phase: GamePhase::Initial,
            winner: None,
            arena,
            controller: ControllerManager::new(self.gamepad_enabled, self.gamepad_source),
            sink,
            rng,
            frame_armed: false,
            last_frame_time: None,
            since_last_frame: 0.0,
            listeners: Vec::new(),
            link: self.link,
        })
    }
}

pub struct Game {
    id: String,
    config: GameConfig,
    phase: GamePhase,
    winner: Option<PlayerSide>,
    arena: Arena,
    controller: ControllerManager,
    sink: Box<dyn RenderSink>,
    rng: Pcg32,
    /// A frame callback is pending
    frame_armed: bool,
    /// Baseline for the next frame's elapsed time; `None` right after arming
    last_frame_time: Option<Instant>,
    since_last_frame: f32,
    listeners: Vec<Sender<GameEvent>>,
    link: Option<RelayLink>,
}

impl Game {
    pub fn builder() -> GameBuilder {
        GameBuilder::new()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn winner(&self) -> Option<PlayerSide> {
        self.winner
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn grid(&self) -> &Grid {
        &self.arena.grid
    }

    pub fn paddle(&self, side: PlayerSide) -> Result<&Paddle> {
        self.arena.paddle(side)
    }

    pub fn controller(&self) -> &ControllerManager {
        &self.controller
    }

    /// Elapsed seconds applied by the most recent tick
    pub fn since_last_frame(&self) -> f32 {
        self.since_last_frame
    }

    pub fn is_frame_armed(&self) -> bool {
        self.frame_armed
    }

    pub fn has_link(&self) -> bool {
        self.link.is_some()
    }

    /// The relay socket is open
    pub fn is_linked(&self) -> bool {
        self.link.as_ref().is_some_and(RelayLink::is_open)
    }

    /// Queue for host input callbacks; drained at the start of each tick
    pub fn input_sender(&self) -> Sender<InputEvent> {
        self.controller.sender()
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = unbounded();
        self.listeners.push(tx);
        rx
    }

    fn reset(&mut self) {
        self.id = new_id(&mut self.rng, SystemTime::now());
        self.phase = GamePhase::Initial;
        self.winner = None;

        self.controller.reset();
        self.arena.reset(&self.config, &mut self.rng);

        self.frame_armed = false;
        self.last_frame_time = None;
        self.since_last_frame = 0.0;
        self.sink.clear();
    }

    /// Reset and paint a single frame without starting the loop
    pub fn splash(&mut self) {
        self.reset();
        self.draw();
    }

    pub fn start(&mut self) {
        if self.phase == GamePhase::Running {
            return;
        }
        self.reset();
        self.phase = GamePhase::Running;
        self.frame_armed = true;
        log::debug!("game {} started", self.id);
        self.emit(GameEvent::Start { id: self.id.clone() });
    }

    pub fn stop(&mut self) {
        if matches!(self.phase, GamePhase::Stopped | GamePhase::Over) {
            return;
        }
        self.phase = GamePhase::Stopped;
        self.frame_armed = false;
        log::debug!("game {} stopped", self.id);
        self.emit(GameEvent::Stop);
    }

    pub fn pause(&mut self) {
        if self.phase != GamePhase::Running {
            return;
        }
        self.phase = GamePhase::Paused;
        self.frame_armed = false;
        log::debug!("game {} paused", self.id);
        self.emit(GameEvent::Pause);
    }

    pub fn resume(&mut self) {
        if self.phase != GamePhase::Paused {
            return;
        }
        self.phase = GamePhase::Running;
        self.frame_armed = true;
        // Time spent paused is not simulated
        self.last_frame_time = None;
        log::debug!("game {} resumed", self.id);
        self.emit(GameEvent::Resume);
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Running => self.pause(),
            GamePhase::Paused => self.resume(),
            _ => {}
        }
    }

    /// End the match; the first recorded winner stands
    pub fn game_over(&mut self, winner: PlayerSide) {
        if self.phase == GamePhase::Over {
            return;
        }
        self.phase = GamePhase::Over;
        self.winner = Some(winner);
        self.frame_armed = false;
        log::info!("game {} over, {} wins", self.id, winner);
        self.emit(GameEvent::GameOver { winner });
    }

    pub fn new_game(&mut self) {
        self.stop();
        self.start();
    }

    /// Stop, release controllers and close the relay link
    pub fn destroy(&mut self) {
        self.stop();
        self.controller.destroy();
        if let Some(mut link) = self.link.take() {
            link.close();
        }
        self.listeners.clear();
    }

    /// Frame callback at host time `now`
    ///
    /// Does nothing unless a frame is armed. The first frame after arming
    /// advances by zero.
    pub fn frame(&mut self, now: Instant) -> Result<()> {
        if !self.frame_armed || self.phase != GamePhase::Running {
            return Ok(());
        }
        let dt = self
            .last_frame_time
            .map(|prev| now.saturating_duration_since(prev).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame_time = Some(now);
        self.advance(dt)
    }

    /// Run one tick of `dt` seconds
    ///
    /// Queued input and remote commands apply first, then gamepads, then the
    /// physics step. Any of the first two may leave the game not running, in
    /// which case the tick ends there.
    pub fn advance(&mut self, dt: f32) -> Result<()> {
        if self.phase != GamePhase::Running {
            return Ok(());
        }
        self.since_last_frame = dt;

        self.process_pending()?;
        if self.phase != GamePhase::Running {
            return Ok(());
        }

        for action in self.controller.update() {
            self.apply_action(action)?;
        }
        if self.phase != GamePhase::Running {
            return Ok(());
        }

        let report = step(&mut self.arena, dt);
        for collision in report.collisions {
            self.emit(GameEvent::Collision(collision));
        }
        if let Some(winner) = report.winner {
            self.game_over(winner);
        }

        self.draw();
        Ok(())
    }

    /// Housekeeping while no frame is armed
    ///
    /// Applies queued input and remote commands, then polls gamepads for the
    /// pause and new game buttons.
    pub fn poll_idle(&mut self) -> Result<()> {
        self.process_pending()?;
        if let Some(action) = self.controller.poll_idle(self.phase) {
            self.apply_action(action)?;
        }
        Ok(())
    }

    fn process_pending(&mut self) -> Result<()> {
        for event in self.controller.drain() {
            self.handle_input(event)?;
        }
        let commands = self
            .link
            .as_ref()
            .map(RelayLink::drain_commands)
            .unwrap_or_default();
        for command in commands {
            self.apply_command(command)?;
        }
        Ok(())
    }

    /// Apply one host input event immediately
    pub fn handle_input(&mut self, event: InputEvent) -> Result<()> {
        for action in self.controller.handle(event) {
            self.apply_action(action)?;
        }
        Ok(())
    }

    fn apply_action(&mut self, action: ControlAction) -> Result<()> {
        match action {
            ControlAction::NewGame => self.new_game(),
            ControlAction::TogglePause => self.toggle_pause(),
            ControlAction::ToggleDebugGrid => self.arena.grid.toggle_debug_grid(),
            ControlAction::Move(intent) => self.set_paddle_movement(intent)?,
        }
        Ok(())
    }

    /// Apply a command received from a remote peer
    pub fn apply_command(&mut self, command: CommandMessage) -> Result<()> {
        log::debug!("remote command: {command:?}");
        match command {
            CommandMessage::Start => self.start(),
            CommandMessage::Stop => self.stop(),
            CommandMessage::Pause => self.pause(),
            CommandMessage::Resume => self.resume(),
            CommandMessage::Restart => self.new_game(),
            CommandMessage::Move { intent } => self.set_paddle_movement(intent)?,
        }
        Ok(())
    }

    /// Set a paddle's movement flags, emitting `move` when they change
    pub fn set_paddle_movement(&mut self, intent: MoveIntent) -> Result<()> {
        let (up, down) = intent.flags();
        let paddle = self.arena.paddle_mut(intent.player_side)?;
        if paddle.move_up == up && paddle.move_down == down {
            return Ok(());
        }
        paddle.set_movement(up, down);
        self.emit(GameEvent::Move {
            intent: MoveIntent::new(intent.player_side, up, down),
        });
        Ok(())
    }

    fn draw(&mut self) {
        draw_arena(self.sink.as_mut(), &self.arena);

        if !self.listeners.is_empty() || self.is_linked() {
            let snapshot = self.arena.snapshot(&self.id, self.phase);
            self.emit(GameEvent::Frame(snapshot));
        }
    }

    fn emit(&mut self, event: GameEvent) {
        if let Some(link) = &self.link {
            link.send(&event);
        }
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
