// src/tracking/initial_search.rs
//
// Full-frame lane search with no prior knowledge.
//
//   1. Column histogram of the bottom half → left/right base columns
//      (peak of each half, first occurrence on ties).
//   2. Horizontal bands scanned bottom → top. Each side collects the on
//      pixels inside [x - margin, x + margin] of its current column.
//   3. A band with at least `min_pixels_to_recenter` pixels moves that side's
//      column to the (truncated) mean x for the next band.
//   4. All collected pixels per side are fit in pixel and meter units.
//
// Bands are `height / window_count` rows tall; rows left over at the top of
// the frame are not scanned.

use super::curve::{LaneFit, PixelSamples, PixelScale};
use crate::error::{LaneError, Result};
use crate::grid::{argmax_first, BinaryGrid};
use crate::types::{LaneSide, SearchConfig};
use tracing::debug;

/// One scanned window, kept for the debug visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub side: LaneSide,
    /// Band index, 0 = bottom.
    pub index: usize,
    /// Inclusive column bounds (may extend past the grid).
    pub x_low: i64,
    pub x_high: i64,
    /// Row range [y_low, y_high).
    pub y_low: usize,
    pub y_high: usize,
    pub pixel_count: usize,
}

#[derive(Debug, Clone)]
pub struct InitialSearch {
    pub left: Result<LaneFit>,
    pub right: Result<LaneFit>,
    pub windows: Vec<SearchWindow>,
    /// Histogram peak columns (left, right).
    pub bases: (usize, usize),
}

impl InitialSearch {
    /// Both fits, or the first side's error.
    pub fn into_pair(self) -> Result<(LaneFit, LaneFit)> {
        Ok((self.left?, self.right?))
    }
}

/// Running state of one side's window column.
struct WindowCursor {
    side: LaneSide,
    x_current: i64,
    samples: PixelSamples,
}

impl WindowCursor {
    fn new(side: LaneSide, x_base: usize) -> Self {
        Self {
            side,
            x_current: x_base as i64,
            samples: PixelSamples::new(),
        }
    }

    /// Collect the band's pixels and recenter when dense enough.
    fn scan_band(
        &mut self,
        grid: &BinaryGrid,
        index: usize,
        y_low: usize,
        y_high: usize,
        config: &SearchConfig,
    ) -> SearchWindow {
        let margin = config.margin as i64;
        let x_low = self.x_current - margin;
        let x_high = self.x_current + margin;

        let mut count = 0usize;
        let mut sum_x = 0u64;
        if let Some((from, to)) = clip_columns(x_low, x_high, grid.width()) {
            for y in y_low..y_high {
                for x in from..=to {
                    if grid.is_on(y, x) {
                        self.samples.push(x, y);
                        sum_x += x as u64;
                        count += 1;
                    }
                }
            }
        }

        if count > 0 && count >= config.min_pixels_to_recenter {
            self.x_current = (sum_x / count as u64) as i64;
        }

        SearchWindow {
            side: self.side,
            index,
            x_low,
            x_high,
            y_low,
            y_high,
            pixel_count: count,
        }
    }
}

/// Clip an inclusive column range to [0, width).
fn clip_columns(x_low: i64, x_high: i64, width: usize) -> Option<(usize, usize)> {
    if width == 0 {
        return None;
    }
    let from = x_low.max(0);
    let to = x_high.min(width as i64 - 1);
    if from > to {
        None
    } else {
        Some((from as usize, to as usize))
    }
}

/// Histogram peak of each half of the frame.
pub fn find_lane_bases(grid: &BinaryGrid) -> (usize, usize) {
    let hist = grid.bottom_half_histogram();
    let hist = hist.to_vec();
    let mid = hist.len() / 2;
    let left = argmax_first(&hist[..mid]);
    let right = argmax_first(&hist[mid..]) + mid;
    (left, right)
}

pub fn initial_search(grid: &BinaryGrid, config: &SearchConfig, scale: &PixelScale) -> InitialSearch {
    let height = grid.height();
    let (left_base, right_base) = find_lane_bases(grid);

    let mut left = WindowCursor::new(LaneSide::Left, left_base);
    let mut right = WindowCursor::new(LaneSide::Right, right_base);

    let window_count = config.window_count.max(1);
    let window_height = height / window_count;
    let mut windows = Vec::with_capacity(window_count * 2);

    if window_height > 0 {
        for index in 0..window_count {
            let y_high = height - index * window_height;
            let y_low = y_high - window_height;
            windows.push(left.scan_band(grid, index, y_low, y_high, config));
            windows.push(right.scan_band(grid, index, y_low, y_high, config));
        }
    }

    debug!(
        "Initial search: bases=({}, {}) windows={}x{}px | left pts={} right pts={}",
        left_base,
        right_base,
        window_count,
        window_height,
        left.samples.len(),
        right.samples.len()
    );

    InitialSearch {
        left: fit_side(left.samples, scale),
        right: fit_side(right.samples, scale),
        windows,
        bases: (left_base, right_base),
    }
}

fn fit_side(samples: PixelSamples, scale: &PixelScale) -> Result<LaneFit> {
    if samples.is_empty() {
        return Err(LaneError::InsufficientPixels { distinct_rows: 0 });
    }
    LaneFit::from_samples(samples, scale)
}
