//! Game state and core simulation types
//!
//! Bodies are created once per game and mutated in place; `reset()` restores
//! construction-time values without reallocating.

use std::fmt;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Collision;
use super::grid::Grid;
use crate::consts::*;
use crate::error::{GameError, Result};
use crate::numbers::random_range;
use crate::renderer::{Color, palette};

/// One of the two competing players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSide {
    Dark,
    Light,
}

impl PlayerSide {
    pub const ALL: [PlayerSide; 2] = [PlayerSide::Dark, PlayerSide::Light];

    /// The other player
    pub fn opponent(self) -> Self {
        match self {
            PlayerSide::Dark => PlayerSide::Light,
            PlayerSide::Light => PlayerSide::Dark,
        }
    }

    /// Horizontal direction a paddle of this side deflects balls toward
    /// (dark defends the left edge, light the right)
    pub fn facing(self) -> f32 {
        match self {
            PlayerSide::Dark => 1.0,
            PlayerSide::Light => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerSide::Dark => "dark",
            PlayerSide::Light => "light",
        }
    }
}

impl fmt::Display for PlayerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Game lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// Constructed or reset, loop not armed
    Initial,
    /// Frame loop armed, simulation advancing
    Running,
    /// Frame loop cancelled, resumable
    Paused,
    /// Frame loop cancelled by `stop()`
    Stopped,
    /// A ball reached its target boundary; only `start()` leaves this state
    Over,
}

/// Construction-time values a ball returns to on reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSpec {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Color,
}

/// A ball owned by one player, attacking the other's territory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    /// Owning player
    pub side: PlayerSide,
    pub pos: Vec2,
    /// Velocity (pixels/s)
    pub vel: Vec2,
    pub radius: f32,
    pub color: Color,
    /// Territory cells captured since the last reset
    pub hops: u32,
    /// Paddle contacts since the last reset
    pub hits: u32,
    spec: BallSpec,
}

impl Ball {
    pub fn new(side: PlayerSide, spec: BallSpec) -> Self {
        Self {
            side,
            pos: spec.pos,
            vel: spec.vel,
            radius: spec.radius,
            color: spec.color,
            hops: 0,
            hits: 0,
            spec,
        }
    }

    /// Territory this ball captures: always the opponent's
    pub fn collision_side(&self) -> PlayerSide {
        self.side.opponent()
    }

    /// Restore construction-time position, velocity, radius and color
    pub fn reset(&mut self) {
        self.pos = self.spec.pos;
        self.vel = self.spec.vel;
        self.radius = self.spec.radius;
        self.color = self.spec.color;
        self.hops = 0;
        self.hits = 0;
    }

    pub fn spec(&self) -> &BallSpec {
        &self.spec
    }

    /// Position after `dt` seconds at the current velocity
    #[inline]
    pub fn projected(&self, dt: f32) -> Vec2 {
        self.pos + self.vel * dt
    }

    pub fn update(&mut self, dt: f32) {
        self.pos = self.projected(dt);
    }
}

/// Construction-time values a paddle returns to on reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleSpec {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Pixels per second
    pub speed: f32,
    pub color: Color,
}

/// A player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub side: PlayerSide,
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub color: Color,
    pub move_up: bool,
    pub move_down: bool,
    spec: PaddleSpec,
}

impl Paddle {
    pub fn new(side: PlayerSide, spec: PaddleSpec) -> Self {
        Self {
            side,
            pos: spec.pos,
            width: spec.width,
            height: spec.height,
            speed: spec.speed,
            color: spec.color,
            move_up: false,
            move_down: false,
            spec,
        }
    }

    pub fn reset(&mut self) {
        self.pos = self.spec.pos;
        self.width = self.spec.width;
        self.height = self.spec.height;
        self.speed = self.spec.speed;
        self.color = self.spec.color;
        self.move_up = false;
        self.move_down = false;
    }

    pub fn set_movement(&mut self, up: bool, down: bool) {
        self.move_up = up;
        self.move_down = down;
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Move by the held direction flags, then clamp so at most 90% of the
    /// paddle leaves the surface. Both flags held cancel out.
    pub fn update(&mut self, dt: f32, surface_height: f32) {
        if self.move_up {
            self.pos.y -= self.speed * dt;
        }
        if self.move_down {
            self.pos.y += self.speed * dt;
        }

        let off_screen = self.height * PADDLE_OFFSCREEN_RATIO;
        self.pos.y = self
            .pos
            .y
            .max(-off_screen)
            .min(surface_height - self.height + off_screen);
    }
}

/// Tuning for a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub cell_size: f32,
    pub ball_radius: f32,
    pub ball_speed: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_speed: f32,
    /// Fixed RNG seed; a random one is drawn when absent
    pub seed: Option<u64>,
    /// Flip each ball's initial vertical direction at random on reset
    pub randomize_direction: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            ball_radius: BALL_RADIUS,
            ball_speed: BALL_SPEED,
            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_speed: PADDLE_SPEED,
            seed: None,
            randomize_direction: false,
        }
    }
}

/// Everything the physics step reads and mutates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub grid: Grid,
    pub paddles: Vec<Paddle>,
    pub balls: Vec<Ball>,
}

impl Arena {
    /// Standard two-player layout
    ///
    /// Dark defends the left edge and launches its ball from the left quarter
    /// toward light's territory; light mirrors it on the right.
    pub fn new<R: Rng>(width: f32, height: f32, config: &GameConfig, rng: &mut R) -> Self {
        let cell = config.cell_size;
        let paddle_y = height / 2.0 - PADDLE_START_OFFSET;
        let speed = config.ball_speed;

        let paddles = vec![
            Paddle::new(
                PlayerSide::Dark,
                PaddleSpec {
                    pos: Vec2::new(cell, paddle_y),
                    width: config.paddle_width,
                    height: config.paddle_height,
                    speed: config.paddle_speed,
                    color: palette::DARK_PADDLE,
                },
            ),
            Paddle::new(
                PlayerSide::Light,
                PaddleSpec {
                    pos: Vec2::new(width - cell * 2.0, paddle_y),
                    width: config.paddle_width,
                    height: config.paddle_height,
                    speed: config.paddle_speed,
                    color: palette::LIGHT_PADDLE,
                },
            ),
        ];

        // Each ball is painted in the opposite tone so it stays visible
        // against the territory it starts in.
        let balls = vec![
            Ball::new(
                PlayerSide::Dark,
                BallSpec {
                    pos: Vec2::new(width / 4.0, random_range(rng, cell, height - cell)),
                    vel: Vec2::new(speed, speed),
                    radius: config.ball_radius,
                    color: palette::LIGHT,
                },
            ),
            Ball::new(
                PlayerSide::Light,
                BallSpec {
                    pos: Vec2::new(width / 4.0 * 3.0, random_range(rng, cell, height - cell)),
                    vel: Vec2::new(-speed, -speed),
                    radius: config.ball_radius,
                    color: palette::DARK,
                },
            ),
        ];

        Self {
            width,
            height,
            grid: Grid::new(width, height, cell),
            paddles,
            balls,
        }
    }

    /// Restore the grid and bodies, then re-roll each ball's vertical start
    pub fn reset<R: Rng>(&mut self, config: &GameConfig, rng: &mut R) {
        let cell = config.cell_size;
        self.grid.reset();
        for paddle in &mut self.paddles {
            paddle.reset();
        }
        for ball in &mut self.balls {
            ball.reset();
            ball.pos.y = random_range(rng, cell, self.height - cell);
            if config.randomize_direction && rng.random_bool(0.5) {
                ball.vel.y = -ball.vel.y;
            }
        }
    }

    pub fn paddle(&self, side: PlayerSide) -> Result<&Paddle> {
        self.paddles
            .iter()
            .find(|p| p.side == side)
            .ok_or(GameError::PaddleNotFound(side))
    }

    pub fn paddle_mut(&mut self, side: PlayerSide) -> Result<&mut Paddle> {
        self.paddles
            .iter_mut()
            .find(|p| p.side == side)
            .ok_or(GameError::PaddleNotFound(side))
    }

    /// Visual snapshot for passive observers
    pub fn snapshot(&self, id: &str, phase: GamePhase) -> FrameSnapshot {
        FrameSnapshot {
            id: id.to_string(),
            phase,
            balls: self
                .balls
                .iter()
                .map(|b| BallView {
                    player_side: b.side,
                    x: b.pos.x,
                    y: b.pos.y,
                    radius: b.radius,
                })
                .collect(),
            paddles: self
                .paddles
                .iter()
                .map(|p| PaddleView {
                    player_side: p.side,
                    x: p.pos.x,
                    y: p.pos.y,
                    width: p.width,
                    height: p.height,
                })
                .collect(),
            cells: (0..self.grid.rows()).map(|row| self.grid.row_string(row)).collect(),
        }
    }
}

/// Paddle movement intent, shared by local input, remote commands and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveIntent {
    pub player_side: PlayerSide,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<bool>,
}

impl MoveIntent {
    pub fn new(player_side: PlayerSide, up: bool, down: bool) -> Self {
        Self {
            player_side,
            up: Some(up),
            down: Some(down),
        }
    }

    /// Resolved flags; an omitted direction means "not held"
    pub fn flags(&self) -> (bool, bool) {
        (self.up.unwrap_or(false), self.down.unwrap_or(false))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallView {
    pub player_side: PlayerSide,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddleView {
    pub player_side: PlayerSide,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything an observer needs to repaint one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub id: String,
    pub phase: GamePhase,
    pub balls: Vec<BallView>,
    pub paddles: Vec<PaddleView>,
    /// One string per grid row, `d` for dark cells and `l` for light
    pub cells: Vec<String>,
}

/// Facts emitted by the orchestrator, one per occurrence
///
/// The serialized form is the `event` half of the sync protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    Start { id: String },
    Stop,
    Pause,
    Resume,
    GameOver { winner: PlayerSide },
    Move {
        #[serde(rename = "move")]
        intent: MoveIntent,
    },
    Collision(Collision),
    Frame(FrameSnapshot),
}
