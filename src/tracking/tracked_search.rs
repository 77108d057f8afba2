// src/tracking/tracked_search.rs
//
// Steady-state search: keep the on pixels within `margin` columns of the
// prior curve at every row and refit. No histogram, no windows.

use super::curve::{CurveModel, LaneFit, PixelSamples, PixelScale};
use crate::error::{LaneError, Result};
use crate::grid::BinaryGrid;
use tracing::debug;

/// Pixels whose column lies within `margin` of `prior.x_at(y)`.
pub fn collect_band(grid: &BinaryGrid, prior: &CurveModel, margin: usize) -> PixelSamples {
    let mut samples = PixelSamples::new();
    let width = grid.width();
    if width == 0 {
        return samples;
    }
    let margin = margin as f64;
    let max_x = (width - 1) as f64;

    for y in 0..grid.height() {
        let center = prior.x_at(y as f64);
        let lo = (center - margin).ceil();
        let hi = (center + margin).floor();
        if !(lo <= max_x && hi >= 0.0) {
            // Off-grid (or non-finite) prediction for this row.
            continue;
        }
        let from = lo.max(0.0) as usize;
        let to = hi.min(max_x) as usize;
        for x in from..=to {
            if grid.is_on(y, x) {
                samples.push(x, y);
            }
        }
    }
    samples
}

pub fn tracked_search(
    grid: &BinaryGrid,
    prior: &CurveModel,
    margin: usize,
    scale: &PixelScale,
) -> Result<LaneFit> {
    let samples = collect_band(grid, prior, margin);
    debug!(
        "Tracked search around a={:.3e} b={:.4} c={:.1} (±{}px): {} pts",
        prior.a,
        prior.b,
        prior.c,
        margin,
        samples.len()
    );
    if samples.is_empty() {
        return Err(LaneError::InsufficientPixels { distinct_rows: 0 });
    }
    LaneFit::from_samples(samples, scale)
}
