//! Ensemble plume-presence counting.

use rayon::prelude::*;
use tracing::debug;

use co2_common::{Co2Error, Co2Result, MaskedGrid};

use crate::smoothing::gaussian_smooth;

/// Cells whose cumulative count is below this are masked in the output.
pub const COUNT_EPSILON: f64 = 1e-4;

/// Result of truncating an ensemble of surfaces.
#[derive(Debug, Clone)]
pub struct PlumeCount {
    /// Per-cell number of realizations with plume presence; zero-count cells are masked.
    pub grid: MaskedGrid,
    /// Number of surfaces that contributed.
    pub plume_count: usize,
}

/// Count, per cell, in how many surfaces the smoothed value exceeds `threshold`.
///
/// Callers drop unavailable realizations before calling. Masked cells are
/// treated as zero before smoothing, so they never count as present unless
/// smoothing spreads a neighbour's plume into them.
///
/// Returns `Ok(None)` when `surfaces` is empty. All surfaces must share the
/// shape of the first one.
pub fn truncate_surfaces(
    surfaces: &[MaskedGrid],
    threshold: f64,
    smoothing: f64,
) -> Co2Result<Option<PlumeCount>> {
    let Some(template) = surfaces.first() else {
        return Ok(None);
    };

    let shape = template.shape();
    if let Some(bad) = surfaces.iter().find(|s| s.shape() != shape) {
        return Err(Co2Error::ShapeMismatch {
            expected: shape,
            found: bad.shape(),
        });
    }

    let (nrow, ncol) = shape;
    let indicators: Vec<Vec<u8>> = surfaces
        .par_iter()
        .map(|surface| {
            let filled = surface.filled(0.0);
            let smoothed = gaussian_smooth(&filled, ncol, nrow, smoothing);
            smoothed
                .iter()
                .map(|v| u8::from(*v > threshold))
                .collect()
        })
        .collect();

    let mut counts = vec![0.0_f64; template.spec.len()];
    for indicator in &indicators {
        for (count, present) in counts.iter_mut().zip(indicator) {
            *count += f64::from(*present);
        }
    }

    let mask = counts.iter().map(|c| *c < COUNT_EPSILON).collect();
    let grid = MaskedGrid::new(template.spec, counts, mask)?;

    debug!(
        surfaces = surfaces.len(),
        threshold = threshold,
        smoothing = smoothing,
        present_cells = grid.valid_count(),
        "Truncated plume surfaces"
    );

    Ok(Some(PlumeCount {
        grid,
        plume_count: surfaces.len(),
    }))
}
