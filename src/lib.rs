//! Territory Pong - a two-player territory capture arena
//!
//! Core modules:
//! - `sim`: Simulation (bodies, territory grid, collisions, game state machine)
//! - `platform`: Input unification (keyboard, pointer, gamepad)
//! - `renderer`: Draw seam over an external 2D surface
//! - `net`: Sync protocol, orchestrator link and broadcast relay
//! - `settings`: Environment-driven configuration

pub mod error;
pub mod net;
pub mod numbers;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{GameError, Result};
pub use settings::{AppEnv, Settings};

/// Game configuration constants
pub mod consts {
    /// Territory cell edge length (pixels)
    pub const CELL_SIZE: f32 = 16.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = CELL_SIZE / 2.0;
    /// Initial ball speed per axis (pixels/s)
    pub const BALL_SPEED: f32 = 300.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = CELL_SIZE;
    pub const PADDLE_HEIGHT: f32 = CELL_SIZE * 5.0;
    /// Paddle speed (pixels/s)
    pub const PADDLE_SPEED: f32 = 500.0;
    /// Vertical offset of the paddle top from the surface middle
    pub const PADDLE_START_OFFSET: f32 = 50.0;
    /// Fraction of the paddle allowed to leave the surface
    pub const PADDLE_OFFSCREEN_RATIO: f32 = 0.9;

    /// Maximum paddle deflection (60 degrees either side of the normal)
    pub const MAX_BOUNCE_ANGLE: f32 = std::f32::consts::FRAC_PI_3;

    /// Gamepad stick dead zone
    pub const AXIS_DEAD_ZONE: f32 = 0.2;
    /// Gamepad button slots
    pub const BUTTON_PAUSE: usize = 8;
    pub const BUTTON_NEW_GAME: usize = 9;
    /// Gamepad axis slots (left/right stick vertical)
    pub const AXIS_LEFT_Y: usize = 1;
    pub const AXIS_RIGHT_Y: usize = 3;

    /// Idle controller poll interval (ms) while the game is not running
    pub const IDLE_POLL_MS: u64 = 100;
    /// Display cadence used by the headless runner
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Default relay port
    pub const DEFAULT_WS_PORT: u16 = 3001;
}
