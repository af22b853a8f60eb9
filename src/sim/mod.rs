//! Simulation module
//!
//! All gameplay logic lives here:
//! - Bodies, territory grid and the per-frame step are pure and synchronous
//! - `Game` owns the lifecycle, input routing and event emission
//! - `Runner` drives a game with a fixed frame interval

pub mod collision;
pub mod game;
pub mod grid;
pub mod runner;
pub mod state;
pub mod tick;

pub use collision::{BallHit, BoundaryHit, Collision, Edge, GridHit, PaddleHit};
pub use game::{Game, GameBuilder};
pub use grid::Grid;
pub use runner::{RunOutcome, Runner};
pub use state::{
    Arena, Ball, FrameSnapshot, GameConfig, GameEvent, GamePhase, MoveIntent, Paddle, PlayerSide,
};
pub use tick::{StepReport, resolve_collisions, step};
