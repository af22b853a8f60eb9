//! Rendering seam
//!
//! The simulation never paints directly. Each frame it walks the arena and
//! issues primitive draw calls against a [`RenderSink`] supplied by the host
//! (a canvas, a terminal, a test recorder). Sinks are write-only apart from
//! their surface size.

pub mod recorder;
pub mod scene;

use serde::{Deserialize, Serialize};

pub use recorder::{DrawOp, RecordingSink};
pub use scene::draw_arena;

/// Opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Build from a packed `0xRRGGBB` value
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    /// `#RRGGBB` string, as used by 2D canvas APIs
    pub fn to_css(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Game palette
pub mod palette {
    use super::Color;

    pub const DARK: Color = Color::from_hex(0x202020);
    pub const LIGHT: Color = Color::from_hex(0xE0E0E0);
    pub const DARK_PADDLE: Color = Color::from_hex(0xC8C8C8);
    pub const LIGHT_PADDLE: Color = Color::from_hex(0x3A3A3A);
    pub const DEBUG_GRID: Color = Color::from_hex(0xFF0000);
}

/// Primitive draw operations over a fixed-size 2D surface
pub trait RenderSink: Send {
    /// Surface size in pixels (width, height)
    fn size(&self) -> (u32, u32);

    /// Clear the whole surface
    fn clear(&mut self);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color);

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color);

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color, line_width: f32);
}
