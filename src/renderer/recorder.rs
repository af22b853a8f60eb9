//! In-memory render sink
//!
//! Records the draw calls of the most recent frame. Used by the headless
//! runner and by tests that assert on what the simulation painted.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Color, RenderSink};

/// A single recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect { x: f32, y: f32, width: f32, height: f32, color: Color },
    FillCircle { x: f32, y: f32, radius: f32, color: Color },
    StrokeRect { x: f32, y: f32, width: f32, height: f32, color: Color, line_width: f32 },
}

#[derive(Debug, Default)]
struct Recording {
    ops: Vec<DrawOp>,
    clears: u64,
}

/// Render sink that keeps the last frame's draw calls
///
/// Clones share the same recording, so a host can hand one clone to the game
/// and keep another for inspection.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    width: u32,
    height: u32,
    inner: Arc<Mutex<Recording>>,
}

impl RecordingSink {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            inner: Arc::new(Mutex::new(Recording::default())),
        }
    }

    /// Draw calls issued since the last clear
    pub fn ops(&self) -> Vec<DrawOp> {
        self.inner.lock().ops.clone()
    }

    /// Number of times the surface was cleared
    pub fn clears(&self) -> u64 {
        self.inner.lock().clears
    }

    pub fn count_circles(&self) -> usize {
        self.inner
            .lock()
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillCircle { .. }))
            .count()
    }

    pub fn count_strokes(&self) -> usize {
        self.inner
            .lock()
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::StrokeRect { .. }))
            .count()
    }
}

impl RenderSink for RecordingSink {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        let mut rec = self.inner.lock();
        rec.ops.clear();
        rec.clears += 1;
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.inner.lock().ops.push(DrawOp::FillRect { x, y, width, height, color });
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        self.inner.lock().ops.push(DrawOp::FillCircle { x, y, radius, color });
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color, line_width: f32) {
        self.inner.lock().ops.push(DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
            color,
            line_width,
        });
    }
}
