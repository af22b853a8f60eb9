//! Error types shared across the crate

use thiserror::Error;

use crate::sim::PlayerSide;

/// Errors raised by game construction, domain queries and configuration
#[derive(Debug, Error)]
pub enum GameError {
    /// The game was built without a render surface
    #[error("could not get 2D context: no render surface was provided")]
    MissingSurface,

    /// The render surface has no drawable area
    #[error("render surface has invalid size {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },

    /// A paddle was requested for a side the arena does not hold
    #[error("paddle not found: {0}")]
    PaddleNotFound(PlayerSide),

    /// A configuration value could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A wire message could not be encoded or decoded
    #[error("malformed message: {0}")]
    Protocol(#[from] serde_json::Error),

    /// Relay socket could not be bound or served
    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, GameError>;
