//! Frame scheduler
//!
//! Drives a [`Game`] from the calling thread. While a frame is armed it ticks
//! at display cadence; otherwise it polls idle input every
//! [`IDLE_POLL_MS`](crate::consts::IDLE_POLL_MS).

use std::time::{Duration, Instant};

use super::game::Game;
use super::state::{GamePhase, PlayerSide};
use crate::consts::{FRAME_DT, IDLE_POLL_MS};
use crate::error::Result;

/// Why [`Runner::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    GameOver(PlayerSide),
    Stopped,
    /// The tick limit was reached first
    TickLimit,
}

#[derive(Debug, Clone)]
pub struct Runner {
    frame_dt: f32,
    idle_interval: Duration,
    /// Sleep between frames and feed wall-clock time instead of a fixed step
    realtime: bool,
    /// Keep idling after game over or stop instead of returning
    keep_alive: bool,
    max_ticks: Option<u64>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            frame_dt: FRAME_DT,
            idle_interval: Duration::from_millis(IDLE_POLL_MS),
            realtime: false,
            keep_alive: false,
            max_ticks: None,
        }
    }
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_dt(mut self, dt: f32) -> Self {
        self.frame_dt = dt;
        self
    }

    pub fn idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Upper bound on frames plus idle polls
    pub fn max_ticks(mut self, max: u64) -> Self {
        self.max_ticks = Some(max);
        self
    }

    pub fn run(&self, game: &mut Game) -> Result<RunOutcome> {
        let mut ticks = 0u64;

        loop {
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                return Ok(RunOutcome::TickLimit);
            }
            ticks += 1;

            match game.phase() {
                GamePhase::Running if self.realtime => {
                    game.frame(Instant::now())?;
                    // A negative or NaN step just means no pause between frames
                    let interval =
                        Duration::try_from_secs_f32(self.frame_dt).unwrap_or(Duration::ZERO);
                    std::thread::sleep(interval);
                }
                GamePhase::Running => game.advance(self.frame_dt)?,
                GamePhase::Over if !self.keep_alive => {
                    return Ok(game.winner().map_or(RunOutcome::Stopped, RunOutcome::GameOver));
                }
                GamePhase::Stopped if !self.keep_alive => return Ok(RunOutcome::Stopped),
                _ => {
                    game.poll_idle()?;
                    if game.phase() != GamePhase::Running {
                        std::thread::sleep(self.idle_interval);
                    }
                }
            }
        }
    }
}
