//! One simulation step
//!
//! Paddles move first, then every ball runs the contact checks in a fixed
//! order (boundary, paddles, other balls, grid), then balls advance. All
//! mutation happens here, synchronously, within a single frame.

use super::collision::{
    Collision, ball_ball_collision, ball_boundary_collision, ball_grid_collision,
    ball_paddle_collision,
};
use super::state::{Arena, PlayerSide};

/// What happened during a step
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    /// Contacts in the order they were resolved
    pub collisions: Vec<Collision>,
    /// Set when a ball reached the back line of the side it attacks
    pub winner: Option<PlayerSide>,
}

/// Advance the arena by `dt` seconds
pub fn step(arena: &mut Arena, dt: f32) -> StepReport {
    for paddle in &mut arena.paddles {
        paddle.update(dt, arena.height);
    }

    let report = resolve_collisions(arena, dt);

    for ball in &mut arena.balls {
        ball.update(dt);
    }

    report
}

/// Run every contact check for every ball and apply the outcomes
///
/// A loss stops resolution for the rest of the frame: the match is decided.
pub fn resolve_collisions(arena: &mut Arena, dt: f32) -> StepReport {
    let mut report = StepReport::default();
    let Arena {
        width,
        height,
        grid,
        paddles,
        balls,
    } = arena;

    for i in 0..balls.len() {
        let projected = balls[i].projected(dt);

        if let Some(hit) = ball_boundary_collision(&balls[i], projected, *width, *height) {
            if hit.loss {
                log::debug!(
                    "{} ball crossed the {} back line",
                    hit.player_side,
                    hit.player_side.opponent()
                );
                report.winner = Some(hit.player_side);
                report.collisions.push(Collision::BallToBoundary(hit));
                return report;
            }
            balls[i].vel = hit.velocity;
            balls[i].pos = hit.position;
            report.collisions.push(Collision::BallToBoundary(hit));
        }

        for paddle in paddles.iter() {
            if let Some(hit) = ball_paddle_collision(&balls[i], paddle, projected) {
                balls[i].vel = hit.velocity;
                balls[i].hits += 1;
                report.collisions.push(Collision::BallToPaddle(hit));
            }
        }

        // Each unordered pair once per frame, so the reversal is not undone
        // when the second ball runs its own checks.
        for j in (i + 1)..balls.len() {
            let (head, tail) = balls.split_at_mut(j);
            let (a, b) = (&mut head[i], &mut tail[0]);
            if let Some(hit) = ball_ball_collision(a, b, projected) {
                a.vel = hit.velocity;
                b.vel = hit.other_velocity;
                report.collisions.push(Collision::BallToBall(hit));
            }
        }

        if let Some(hit) = ball_grid_collision(&balls[i], projected, grid, dt) {
            let ball = &mut balls[i];
            ball.vel = hit.velocity;
            ball.pos = hit.position;
            ball.hops += 1;
            grid.set_cell(hit.col, hit.row, ball.side);
            report.collisions.push(Collision::BallToGrid(hit));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GameConfig;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn arena() -> Arena {
        let mut rng = Pcg32::seed_from_u64(3);
        Arena::new(512.0, 512.0, &GameConfig::default(), &mut rng)
    }

    fn ball_index(arena: &Arena, side: PlayerSide) -> usize {
        arena.balls.iter().position(|b| b.side == side).unwrap()
    }

    #[test]
    fn test_midfield_ball_just_advances() {
        let mut arena = arena();
        let d = ball_index(&arena, PlayerSide::Dark);
        let l = ball_index(&arena, PlayerSide::Light);
        arena.balls[d].pos = Vec2::new(100.0, 100.0);
        arena.balls[d].vel = Vec2::new(300.0, 300.0);
        arena.balls[l].pos = Vec2::new(400.0, 400.0);
        arena.balls[l].vel = Vec2::new(0.0, 0.0);

        let report = step(&mut arena, 0.1);
        assert!(report.collisions.is_empty());
        assert!(report.winner.is_none());
        let pos = arena.balls[d].pos;
        assert!((pos.x - 130.0).abs() < 1e-3);
        assert!((pos.y - 130.0).abs() < 1e-3);
    }

    #[test]
    fn test_capture_flips_exactly_one_cell() {
        let mut arena = arena();
        let d = ball_index(&arena, PlayerSide::Dark);
        let l = ball_index(&arena, PlayerSide::Light);
        arena.balls[l].pos = Vec2::new(400.0, 400.0);
        arena.balls[l].vel = Vec2::ZERO;
        arena.balls[d].pos = Vec2::new(250.0, 100.0);
        arena.balls[d].vel = Vec2::new(100.0, 40.0);

        let light_before = arena.grid.count(PlayerSide::Light);
        let report = resolve_collisions(&mut arena, 0.1);

        // Projected (260, 104) is col 16, row 6: light's first column
        assert_eq!(arena.grid.get_cell(16, 6), PlayerSide::Dark);
        assert_eq!(arena.grid.count(PlayerSide::Light), light_before - 1);
        assert_eq!(arena.balls[d].vel, Vec2::new(-100.0, -40.0));
        assert_eq!(arena.balls[d].hops, 1);
        assert!(matches!(report.collisions.as_slice(), [Collision::BallToGrid(_)]));
    }

    #[test]
    fn test_loss_reports_winner_and_stops() {
        let mut arena = arena();
        let d = ball_index(&arena, PlayerSide::Dark);
        let l = ball_index(&arena, PlayerSide::Light);
        // Light's ball about to cross dark's back line
        arena.balls[l].pos = Vec2::new(10.0, 300.0);
        arena.balls[l].vel = Vec2::new(-300.0, 0.0);
        arena.balls[d].pos = Vec2::new(200.0, 100.0);
        arena.balls[d].vel = Vec2::new(10.0, 0.0);

        let report = resolve_collisions(&mut arena, 0.1);
        assert_eq!(report.winner, Some(PlayerSide::Light));
        match report.collisions.last() {
            Some(Collision::BallToBoundary(hit)) => assert!(hit.loss),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_own_back_line_bounces() {
        let mut arena = arena();
        let d = ball_index(&arena, PlayerSide::Dark);
        let l = ball_index(&arena, PlayerSide::Light);
        arena.balls[d].pos = Vec2::new(9.0, 300.0);
        arena.balls[d].vel = Vec2::new(-300.0, 0.0);
        arena.balls[l].pos = Vec2::new(300.0, 100.0);
        arena.balls[l].vel = Vec2::ZERO;

        let report = resolve_collisions(&mut arena, 0.1);
        assert!(report.winner.is_none());
        assert_eq!(arena.balls[d].pos.x, 8.0);
        assert_eq!(arena.balls[d].vel.x, 300.0);
    }

    #[test]
    fn test_overlapping_balls_invert_once() {
        let mut arena = arena();
        let d = ball_index(&arena, PlayerSide::Dark);
        let l = ball_index(&arena, PlayerSide::Light);
        // Overlapping across the midline, each inside its own territory
        arena.balls[d].pos = Vec2::new(250.0, 100.0);
        arena.balls[d].vel = Vec2::new(10.0, 20.0);
        arena.balls[l].pos = Vec2::new(262.0, 100.0);
        arena.balls[l].vel = Vec2::new(-30.0, 40.0);

        let report = resolve_collisions(&mut arena, 0.01);
        assert_eq!(arena.balls[d].vel, Vec2::new(-10.0, -20.0));
        assert_eq!(arena.balls[l].vel, Vec2::new(30.0, -40.0));
        assert_eq!(
            report
                .collisions
                .iter()
                .filter(|c| matches!(c, Collision::BallToBall(_)))
                .count(),
            1
        );
    }

    #[test]
    fn test_paddle_hit_counts() {
        let mut arena = arena();
        let d = ball_index(&arena, PlayerSide::Dark);
        let l = ball_index(&arena, PlayerSide::Light);
        let paddle_center = arena.paddle(PlayerSide::Dark).unwrap().center();
        arena.balls[l].pos = Vec2::new(paddle_center.x + 14.0, paddle_center.y);
        arena.balls[l].vel = Vec2::new(-300.0, 0.0);
        arena.balls[d].pos = Vec2::new(200.0, 450.0);
        arena.balls[d].vel = Vec2::ZERO;
        // Keep the cell under the strike point from being captured as well
        let (col, row) = arena.grid.locate(paddle_center.x + 11.0, paddle_center.y, 16.0).unwrap();
        arena.grid.set_cell(col, row, PlayerSide::Light);

        resolve_collisions(&mut arena, 0.01);
        assert_eq!(arena.balls[l].hits, 1);
        assert!(arena.balls[l].vel.x > 0.0);
    }
}
