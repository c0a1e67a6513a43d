//! Background lattice displaced by the combined field.
//!
//! A `WarpGrid` stores `cols * rows` rest positions in row-major order,
//! spaced `spacing` apart and covering the world bounds plus one extra
//! spacing. Each tick every node's displacement is recomputed from scratch
//! as the total influence at its rest position.

use crate::error::EngineError;
use crate::field_source::Influence;
use glam::DVec2;

/// Upper bound on `cols * rows`.
pub const MAX_NODES: usize = 1 << 20;

/// Row-major lattice of rest positions and their current displacements.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpGrid {
    spacing: f64,
    cols: usize,
    rows: usize,
    rest: Vec<DVec2>,
    displacement: Vec<DVec2>,
}

impl WarpGrid {
    /// Builds a lattice covering `[0, bounds + spacing]` on both axes.
    ///
    /// Returns `EngineError::InvalidDimensions` for non-positive or
    /// non-finite bounds or a lattice above [`MAX_NODES`], and
    /// `EngineError::InvalidConfig` for a bad spacing.
    pub fn new(bounds: DVec2, spacing: f64) -> Result<Self, EngineError> {
        if !bounds.is_finite() || bounds.x <= 0.0 || bounds.y <= 0.0 {
            return Err(EngineError::InvalidDimensions);
        }
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "grid spacing must be finite and > 0, got {spacing}"
            )));
        }
        let count = |extent: f64| {
            let cells = (extent / spacing).floor();
            if cells >= MAX_NODES as f64 {
                return None;
            }
            (cells as usize).checked_add(2)
        };
        let (cols, rows) = count(bounds.x)
            .zip(count(bounds.y))
            .ok_or(EngineError::InvalidDimensions)?;
        let len = cols
            .checked_mul(rows)
            .filter(|&len| len <= MAX_NODES)
            .ok_or(EngineError::InvalidDimensions)?;

        let rest = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| DVec2::new(c as f64, r as f64) * spacing))
            .collect();

        Ok(Self {
            spacing,
            cols,
            rows,
            rest,
            displacement: vec![DVec2::ZERO; len],
        })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn len(&self) -> usize {
        self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Rest position of node `(col, row)`.
    pub fn rest(&self, col: usize, row: usize) -> Option<DVec2> {
        self.flat(col, row).map(|i| self.rest[i])
    }

    /// Current (displaced) position of node `(col, row)`.
    pub fn node(&self, col: usize, row: usize) -> Option<DVec2> {
        self.flat(col, row)
            .map(|i| self.rest[i] + self.displacement[i])
    }

    /// Current displacement of node `(col, row)`.
    pub fn displacement(&self, col: usize, row: usize) -> Option<DVec2> {
        self.flat(col, row).map(|i| self.displacement[i])
    }

    fn flat(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }

    /// Resets every node, then displaces it by `field` sampled at rest.
    pub fn update<F: Influence + ?Sized>(&mut self, field: &F) {
        for (rest, disp) in self.rest.iter().zip(self.displacement.iter_mut()) {
            *disp = field.influence_at(*rest);
        }
    }

    /// Displaced positions of one row, left to right.
    pub fn row_points(&self, row: usize) -> impl Iterator<Item = DVec2> + '_ {
        let start = row.min(self.rows) * self.cols;
        let end = if row < self.rows { start + self.cols } else { start };
        (start..end).map(move |i| self.rest[i] + self.displacement[i])
    }

    /// Displaced positions of one column, top to bottom.
    pub fn column_points(&self, col: usize) -> impl Iterator<Item = DVec2> + '_ {
        let rows = if col < self.cols { self.rows } else { 0 };
        (0..rows).map(move |r| {
            let i = r * self.cols + col;
            self.rest[i] + self.displacement[i]
        })
    }
}
