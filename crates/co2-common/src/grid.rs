//! Regular 2D surface grids with a validity mask.

use serde::{Deserialize, Serialize};

use crate::{Co2Error, Co2Result};

/// Geometry of a regular, possibly rotated, surface grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of columns (x direction)
    pub ncol: usize,
    /// Number of rows (y direction)
    pub nrow: usize,
    /// Origin x coordinate
    pub xori: f64,
    /// Origin y coordinate
    pub yori: f64,
    /// Cell size in x
    pub xinc: f64,
    /// Cell size in y
    pub yinc: f64,
    /// Rotation around the origin, degrees counter-clockwise
    #[serde(default)]
    pub rotation_deg: f64,
}

impl GridSpec {
    /// Create an unrotated grid specification.
    pub fn new(ncol: usize, nrow: usize, xori: f64, yori: f64, xinc: f64, yinc: f64) -> Self {
        Self {
            ncol,
            nrow,
            xori,
            yori,
            xinc,
            yinc,
            rotation_deg: 0.0,
        }
    }

    /// Total number of grid cells.
    pub fn len(&self) -> usize {
        self.ncol * self.nrow
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.ncol == 0 || self.nrow == 0
    }

    /// Bounds of the unrotated grid as (x_min, y_min, x_max, y_max).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let x_max = self.xori + self.ncol.saturating_sub(1) as f64 * self.xinc;
        let y_max = self.yori + self.nrow.saturating_sub(1) as f64 * self.yinc;
        (
            self.xori.min(x_max),
            self.yori.min(y_max),
            self.xori.max(x_max),
            self.yori.max(y_max),
        )
    }
}

/// A surface grid: row-major values plus a mask where `true` marks an invalid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedGrid {
    pub spec: GridSpec,
    pub values: Vec<f64>,
    pub mask: Vec<bool>,
}

impl MaskedGrid {
    /// Create a grid, checking that values and mask match the geometry.
    pub fn new(spec: GridSpec, values: Vec<f64>, mask: Vec<bool>) -> Co2Result<Self> {
        if values.len() != spec.len() || mask.len() != spec.len() {
            return Err(Co2Error::InvalidGrid(format!(
                "expected {} cells, got {} values and {} mask entries",
                spec.len(),
                values.len(),
                mask.len()
            )));
        }
        Ok(Self { spec, values, mask })
    }

    /// Create a grid where every non-finite value is masked.
    pub fn from_values(spec: GridSpec, values: Vec<f64>) -> Co2Result<Self> {
        let mask = values.iter().map(|v| !v.is_finite()).collect();
        Self::new(spec, values, mask)
    }

    /// (nrow, ncol)
    pub fn shape(&self) -> (usize, usize) {
        (self.spec.nrow, self.spec.ncol)
    }

    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.spec.ncol + col
    }

    /// Value at a cell, `None` if outside the grid or masked.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.spec.nrow || col >= self.spec.ncol {
            return None;
        }
        let i = self.index(row, col);
        if self.mask[i] {
            None
        } else {
            Some(self.values[i])
        }
    }

    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_none()
    }

    /// Iterator over values of valid cells.
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .zip(&self.mask)
            .filter(|(_, masked)| !**masked)
            .map(|(v, _)| *v)
    }

    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|m| !**m).count()
    }

    /// (min, max) over valid cells, `None` if every cell is masked.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.valid_values().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Sum over valid cells.
    pub fn masked_sum(&self) -> f64 {
        self.valid_values().sum()
    }

    /// Divide every value by `divisor`.
    pub fn scale_by(&mut self, divisor: f64) {
        for v in &mut self.values {
            *v /= divisor;
        }
    }

    /// Mask every valid cell whose value is at or below `threshold`.
    pub fn mask_at_or_below(&mut self, threshold: f64) {
        for (v, m) in self.values.iter().zip(self.mask.iter_mut()) {
            if *v <= threshold {
                *m = true;
            }
        }
    }

    /// Values with masked cells replaced by `fill`.
    pub fn filled(&self, fill: f64) -> Vec<f64> {
        self.values
            .iter()
            .zip(&self.mask)
            .map(|(v, m)| if *m { fill } else { *v })
            .collect()
    }
}
