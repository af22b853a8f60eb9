//! Arena painter
//!
//! Paint order is fixed: territory, optional cell outlines, paddles, balls.

use super::{RenderSink, palette};
use crate::sim::state::{Arena, PlayerSide};

const DEBUG_LINE_WIDTH: f32 = 0.1;

/// Paint one full frame of the arena onto `sink`
pub fn draw_arena(sink: &mut dyn RenderSink, arena: &Arena) {
    sink.clear();

    let grid = &arena.grid;
    let size = grid.cell_size();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let color = match grid.get_cell(col, row) {
                PlayerSide::Dark => palette::DARK,
                PlayerSide::Light => palette::LIGHT,
            };
            sink.fill_rect(col as f32 * size, row as f32 * size, size, size, color);
        }
    }

    if grid.show_debug_grid() {
        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                sink.stroke_rect(
                    col as f32 * size,
                    row as f32 * size,
                    size,
                    size,
                    palette::DEBUG_GRID,
                    DEBUG_LINE_WIDTH,
                );
            }
        }
    }

    for paddle in &arena.paddles {
        sink.fill_rect(paddle.pos.x, paddle.pos.y, paddle.width, paddle.height, paddle.color);
    }

    for ball in &arena.balls {
        sink.fill_circle(ball.pos.x, ball.pos.y, ball.radius, ball.color);
    }
}
