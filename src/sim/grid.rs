//! Territory grid
//!
//! Every cell is owned by exactly one side. The map starts split down the
//! middle (left half dark, right half light) and only changes when a ball
//! captures a cell.

use serde::{Deserialize, Serialize};

use super::state::PlayerSide;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: f32,
    height: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,
    /// Row-major ownership map
    cells: Vec<PlayerSide>,
    /// Draw cell outlines; no gameplay effect
    show_debug: bool,
}

impl Grid {
    /// Grid covering a `width` x `height` surface, rounding partial cells up
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let mut grid = Self {
            width,
            height,
            cell_size,
            cols: 0,
            rows: 0,
            cells: Vec::new(),
            show_debug: false,
        };
        grid.init();
        grid
    }

    fn init(&mut self) {
        self.cols = (self.width / self.cell_size).ceil() as usize;
        self.rows = (self.height / self.cell_size).ceil() as usize;
        let mid = self.cols / 2;

        self.cells.clear();
        self.cells.reserve(self.cols * self.rows);
        for _row in 0..self.rows {
            for col in 0..self.cols {
                self.cells.push(if col < mid {
                    PlayerSide::Dark
                } else {
                    PlayerSide::Light
                });
            }
        }
    }

    /// Rebuild the initial split from the construction dimensions
    pub fn reset(&mut self) {
        self.init();
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Owner of the cell at column `col` (horizontal), row `row` (vertical)
    ///
    /// Coordinates must be in range.
    pub fn get_cell(&self, col: usize, row: usize) -> PlayerSide {
        debug_assert!(col < self.cols && row < self.rows);
        self.cells[row * self.cols + col]
    }

    /// Set the owner of the cell at column `col`, row `row`
    ///
    /// Coordinates must be in range.
    pub fn set_cell(&mut self, col: usize, row: usize, side: PlayerSide) {
        debug_assert!(col < self.cols && row < self.rows);
        self.cells[row * self.cols + col] = side;
    }

    /// Column/row covering a point for a given cell size, if inside the grid
    pub fn locate(&self, x: f32, y: f32, cell_size: f32) -> Option<(usize, usize)> {
        let col = (x / cell_size).floor();
        let row = (y / cell_size).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        (col < self.cols && row < self.rows).then_some((col, row))
    }

    /// Number of cells currently owned by `side`
    pub fn count(&self, side: PlayerSide) -> usize {
        self.cells.iter().filter(|&&c| c == side).count()
    }

    pub fn toggle_debug_grid(&mut self) {
        self.show_debug = !self.show_debug;
    }

    pub fn show_debug_grid(&self) -> bool {
        self.show_debug
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Compact row encoding: `d` for dark, `l` for light
    pub fn row_string(&self, row: usize) -> String {
        self.cells[row * self.cols..(row + 1) * self.cols]
            .iter()
            .map(|c| match c {
                PlayerSide::Dark => 'd',
                PlayerSide::Light => 'l',
            })
            .collect()
    }
}
