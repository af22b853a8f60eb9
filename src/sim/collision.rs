//! Collision detection and response
//!
//! Every check is a pure function of the bodies it inspects. Contact is
//! decided on the ball's projected position (current + velocity * dt); the
//! returned hit record carries the resulting velocity/position so the step
//! can apply it and report it upward without re-deriving any physics.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::Grid;
use super::state::{Ball, Paddle, PlayerSide};
use crate::consts::MAX_BOUNCE_ANGLE;

/// Surface edge touched by a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    /// Player whose back line this edge is (top and bottom belong to nobody)
    pub fn owner(self) -> Option<PlayerSide> {
        match self {
            Edge::Left => Some(PlayerSide::Dark),
            Edge::Right => Some(PlayerSide::Light),
            Edge::Top | Edge::Bottom => None,
        }
    }
}

/// Ball touched the surface extent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryHit {
    /// Owner of the ball
    pub player_side: PlayerSide,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<Edge>,
    /// The ball reached the back line of the side it attacks
    pub loss: bool,
    pub velocity: Vec2,
    /// Position clamped off the touched edges
    pub position: Vec2,
}

/// Ball struck a paddle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddleHit {
    pub player_side: PlayerSide,
    pub paddle_side: PlayerSide,
    /// Exit angle relative to the paddle normal (radians, within ±π/3)
    pub angle: f32,
    pub velocity: Vec2,
}

/// Two balls overlapped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallHit {
    pub player_side: PlayerSide,
    pub other_side: PlayerSide,
    pub velocity: Vec2,
    pub other_velocity: Vec2,
}

/// Ball captured a territory cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridHit {
    pub player_side: PlayerSide,
    pub col: usize,
    pub row: usize,
    /// Owner of the cell before the capture
    pub captured_from: PlayerSide,
    pub velocity: Vec2,
    /// Projected position rolled back one step
    pub position: Vec2,
}

/// A resolved contact, as reported to the orchestrator and the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Collision {
    BallToBoundary(BoundaryHit),
    BallToPaddle(PaddleHit),
    BallToBall(BallHit),
    BallToGrid(GridHit),
}

impl Collision {
    /// Owner of the ball that triggered the contact
    pub fn player_side(&self) -> PlayerSide {
        match self {
            Collision::BallToBoundary(hit) => hit.player_side,
            Collision::BallToPaddle(hit) => hit.player_side,
            Collision::BallToBall(hit) => hit.player_side,
            Collision::BallToGrid(hit) => hit.player_side,
        }
    }
}

/// Check the ball's projected position against the surface extent
///
/// Touched axes have their velocity reversed and position clamped to one
/// radius from the edge; untouched axes keep the ball's current values.
pub fn ball_boundary_collision(
    ball: &Ball,
    projected: Vec2,
    width: f32,
    height: f32,
) -> Option<BoundaryHit> {
    let r = ball.radius;
    let mut velocity = ball.vel;
    let mut position = ball.pos;

    let horizontal = if projected.x - r <= 0.0 {
        position.x = r;
        Some(Edge::Left)
    } else if projected.x + r >= width {
        position.x = width - r;
        Some(Edge::Right)
    } else {
        None
    };
    if horizontal.is_some() {
        velocity.x = -ball.vel.x;
    }

    let vertical = if projected.y - r <= 0.0 {
        position.y = r;
        Some(Edge::Top)
    } else if projected.y + r >= height {
        position.y = height - r;
        Some(Edge::Bottom)
    } else {
        None
    };
    if vertical.is_some() {
        velocity.y = -ball.vel.y;
    }

    if horizontal.is_none() && vertical.is_none() {
        return None;
    }

    let loss = horizontal.and_then(Edge::owner) == Some(ball.collision_side());

    Some(BoundaryHit {
        player_side: ball.side,
        horizontal,
        vertical,
        loss,
        velocity,
        position,
    })
}

/// Circle vs axis-aligned box, then redirect by where the paddle was struck
///
/// The exit angle maps the ball's offset from the paddle center linearly onto
/// ±60° from the paddle normal; speed magnitude is preserved and the
/// horizontal sign always points away from the paddle.
pub fn ball_paddle_collision(ball: &Ball, paddle: &Paddle, projected: Vec2) -> Option<PaddleHit> {
    let half_w = paddle.width / 2.0;
    let half_h = paddle.height / 2.0;
    let center = paddle.center();

    let dist_x = (projected.x - center.x).abs();
    let dist_y = (projected.y - center.y).abs();

    if dist_x > half_w + ball.radius || dist_y > half_h + ball.radius {
        return None;
    }

    let touching = if dist_x <= half_w || dist_y <= half_h {
        true
    } else {
        let dx = dist_x - half_w;
        let dy = dist_y - half_h;
        dx * dx + dy * dy <= ball.radius * ball.radius
    };
    if !touching {
        return None;
    }

    // Strike point uses the current (not projected) height
    let offset = ((ball.pos.y - center.y) / half_h).clamp(-1.0, 1.0);
    let angle = MAX_BOUNCE_ANGLE * offset;
    let magnitude = ball.vel.length();

    Some(PaddleHit {
        player_side: ball.side,
        paddle_side: paddle.side,
        angle,
        velocity: Vec2::new(
            paddle.side.facing() * magnitude * angle.cos(),
            magnitude * angle.sin(),
        ),
    })
}

/// Overlapping balls both reverse their full velocity
pub fn ball_ball_collision(a: &Ball, b: &Ball, a_projected: Vec2) -> Option<BallHit> {
    if a_projected.distance(b.pos) < a.radius + b.radius {
        Some(BallHit {
            player_side: a.side,
            other_side: b.side,
            velocity: -a.vel,
            other_velocity: -b.vel,
        })
    } else {
        None
    }
}

/// Check the cell under the ball's projected position
///
/// Cells are sized from the ball (`2 * radius`). A cell owned by the side the
/// ball attacks is captured: velocity reverses and the position rolls back
/// one step along the pre-reversal velocity.
pub fn ball_grid_collision(ball: &Ball, projected: Vec2, grid: &Grid, dt: f32) -> Option<GridHit> {
    let cell_size = ball.radius * 2.0;
    let (col, row) = grid.locate(projected.x, projected.y, cell_size)?;

    let owner = grid.get_cell(col, row);
    if owner != ball.collision_side() {
        return None;
    }

    Some(GridHit {
        player_side: ball.side,
        col,
        row,
        captured_from: owner,
        velocity: -ball.vel,
        position: projected - ball.vel * dt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::palette;
    use crate::sim::state::{BallSpec, PaddleSpec};

    fn ball(side: PlayerSide, pos: Vec2, vel: Vec2) -> Ball {
        Ball::new(
            side,
            BallSpec {
                pos,
                vel,
                radius: 8.0,
                color: palette::LIGHT,
            },
        )
    }

    fn paddle(side: PlayerSide, x: f32, y: f32) -> Paddle {
        Paddle::new(
            side,
            PaddleSpec {
                pos: Vec2::new(x, y),
                width: 16.0,
                height: 80.0,
                speed: 500.0,
                color: palette::DARK_PADDLE,
            },
        )
    }

    #[test]
    fn test_boundary_left_bounce_clamps_to_radius() {
        let b = ball(PlayerSide::Dark, Vec2::new(8.0 - 0.01, 200.0), Vec2::new(-300.0, 0.0));
        let hit = ball_boundary_collision(&b, b.pos, 512.0, 512.0).unwrap();
        assert_eq!(hit.horizontal, Some(Edge::Left));
        assert_eq!(hit.velocity.x, 300.0);
        assert_eq!(hit.position.x, 8.0);
        // Dark's ball attacks light; the left edge is dark's own line
        assert!(!hit.loss);
    }

    #[test]
    fn test_boundary_loss_on_attacked_edge() {
        let b = ball(PlayerSide::Dark, Vec2::new(500.0, 200.0), Vec2::new(300.0, 0.0));
        let hit = ball_boundary_collision(&b, Vec2::new(505.0, 200.0), 512.0, 512.0).unwrap();
        assert_eq!(hit.horizontal, Some(Edge::Right));
        assert!(hit.loss);

        let b = ball(PlayerSide::Light, Vec2::new(10.0, 200.0), Vec2::new(-300.0, 0.0));
        let hit = ball_boundary_collision(&b, Vec2::new(5.0, 200.0), 512.0, 512.0).unwrap();
        assert_eq!(hit.horizontal, Some(Edge::Left));
        assert!(hit.loss);
    }

    #[test]
    fn test_boundary_top_bottom_never_lose() {
        let b = ball(PlayerSide::Light, Vec2::new(200.0, 10.0), Vec2::new(100.0, -300.0));
        let hit = ball_boundary_collision(&b, Vec2::new(210.0, 5.0), 512.0, 512.0).unwrap();
        assert_eq!(hit.vertical, Some(Edge::Top));
        assert_eq!(hit.horizontal, None);
        assert_eq!(hit.velocity, Vec2::new(100.0, 300.0));
        assert_eq!(hit.position, Vec2::new(200.0, 8.0));
        assert!(!hit.loss);

        let hit = ball_boundary_collision(&b, Vec2::new(210.0, 509.0), 512.0, 512.0).unwrap();
        assert_eq!(hit.vertical, Some(Edge::Bottom));
        assert_eq!(hit.position.y, 504.0);
    }

    #[test]
    fn test_boundary_corner_hits_both_axes() {
        let b = ball(PlayerSide::Dark, Vec2::new(9.0, 9.0), Vec2::new(-100.0, -100.0));
        let hit = ball_boundary_collision(&b, Vec2::new(4.0, 4.0), 512.0, 512.0).unwrap();
        assert_eq!(hit.velocity, Vec2::new(100.0, 100.0));
        assert_eq!(hit.position, Vec2::new(8.0, 8.0));
    }

    #[test]
    fn test_boundary_midfield_none() {
        let b = ball(PlayerSide::Dark, Vec2::new(100.0, 100.0), Vec2::new(300.0, 300.0));
        assert!(ball_boundary_collision(&b, Vec2::new(130.0, 130.0), 512.0, 512.0).is_none());
    }

    #[test]
    fn test_paddle_center_exits_straight() {
        let p = paddle(PlayerSide::Dark, 16.0, 200.0);
        // Paddle center is (24, 240)
        let b = ball(PlayerSide::Light, Vec2::new(40.0, 240.0), Vec2::new(-300.0, 0.0));
        let hit = ball_paddle_collision(&b, &p, Vec2::new(35.0, 240.0)).unwrap();
        assert_eq!(hit.angle, 0.0);
        assert!((hit.velocity.x - 300.0).abs() < 1e-3);
        assert!(hit.velocity.y.abs() < 1e-3);
    }

    #[test]
    fn test_paddle_top_edge_exits_at_sixty_degrees() {
        let mag = Vec2::new(-300.0, 300.0).length();

        let p = paddle(PlayerSide::Dark, 16.0, 200.0);
        let b = ball(PlayerSide::Light, Vec2::new(36.0, 200.0), Vec2::new(-300.0, 300.0));
        let hit = ball_paddle_collision(&b, &p, Vec2::new(33.0, 203.0)).unwrap();
        assert!((hit.angle + MAX_BOUNCE_ANGLE).abs() < 1e-5);
        assert!((hit.velocity.length() - mag).abs() < 1e-2);
        assert!(hit.velocity.x > 0.0);
        assert!((hit.velocity.y.atan2(hit.velocity.x) + MAX_BOUNCE_ANGLE).abs() < 1e-4);

        let p = paddle(PlayerSide::Light, 480.0, 200.0);
        let b = ball(PlayerSide::Dark, Vec2::new(476.0, 200.0), Vec2::new(300.0, 300.0));
        let hit = ball_paddle_collision(&b, &p, Vec2::new(479.0, 203.0)).unwrap();
        assert!((hit.angle + MAX_BOUNCE_ANGLE).abs() < 1e-5);
        assert!(hit.velocity.x < 0.0);
        // Mirrored: 60° above the leftward normal
        let up_from_left = (-hit.velocity.y).atan2(-hit.velocity.x);
        assert!((up_from_left - MAX_BOUNCE_ANGLE).abs() < 1e-4);
    }

    #[test]
    fn test_paddle_miss_and_corner() {
        let p = paddle(PlayerSide::Dark, 16.0, 200.0);
        let b = ball(PlayerSide::Light, Vec2::new(100.0, 240.0), Vec2::new(-300.0, 0.0));
        assert!(ball_paddle_collision(&b, &p, b.pos).is_none());

        // Inside the expanded box but outside the rounded corner
        let corner = Vec2::new(32.0 + 7.0, 200.0 - 7.0);
        assert!(ball_paddle_collision(&b, &p, corner).is_none());

        let corner = Vec2::new(32.0 + 5.0, 200.0 - 5.0);
        assert!(ball_paddle_collision(&b, &p, corner).is_some());
    }

    #[test]
    fn test_ball_to_ball_inverts_both() {
        let a = ball(PlayerSide::Dark, Vec2::new(100.0, 100.0), Vec2::new(300.0, 200.0));
        let b = ball(PlayerSide::Light, Vec2::new(120.0, 100.0), Vec2::new(-300.0, -100.0));
        let hit = ball_ball_collision(&a, &b, Vec2::new(105.0, 100.0)).unwrap();
        assert_eq!(hit.velocity, Vec2::new(-300.0, -200.0));
        assert_eq!(hit.other_velocity, Vec2::new(300.0, 100.0));

        assert!(ball_ball_collision(&a, &b, Vec2::new(80.0, 100.0)).is_none());
    }

    #[test]
    fn test_grid_capture_of_attacked_cell() {
        let grid = Grid::new(512.0, 512.0, 16.0);
        // Dark's ball inside light territory (col 20, row 5)
        let b = ball(PlayerSide::Dark, Vec2::new(320.0, 88.0), Vec2::new(100.0, 50.0));
        let projected = b.projected(0.1);
        let hit = ball_grid_collision(&b, projected, &grid, 0.1).unwrap();
        assert_eq!((hit.col, hit.row), (20, 5));
        assert_eq!(hit.captured_from, PlayerSide::Light);
        assert_eq!(hit.velocity, Vec2::new(-100.0, -50.0));
        assert_eq!(hit.position, b.pos);
    }

    #[test]
    fn test_grid_ignores_own_cells_and_outside() {
        let grid = Grid::new(512.0, 512.0, 16.0);
        let b = ball(PlayerSide::Dark, Vec2::new(100.0, 100.0), Vec2::new(300.0, 300.0));
        assert!(ball_grid_collision(&b, b.projected(0.1), &grid, 0.1).is_none());
        assert!(ball_grid_collision(&b, Vec2::new(-4.0, 100.0), &grid, 0.1).is_none());
        assert!(ball_grid_collision(&b, Vec2::new(600.0, 100.0), &grid, 0.1).is_none());
    }

    #[test]
    fn test_collision_wire_shape() {
        let hit = Collision::BallToGrid(GridHit {
            player_side: PlayerSide::Light,
            col: 3,
            row: 4,
            captured_from: PlayerSide::Dark,
            velocity: Vec2::new(1.0, 2.0),
            position: Vec2::new(3.0, 4.0),
        });
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["kind"], "ballToGrid");
        assert_eq!(json["playerSide"], "light");
        assert_eq!(json["capturedFrom"], "dark");
        assert_eq!(hit.player_side(), PlayerSide::Light);
    }
}
