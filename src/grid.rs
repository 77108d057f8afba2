// src/grid.rs
//
// Binary lane mask in warped (bird's-eye) space.
//
// Rows are image y (0 = top), columns are image x. Any non-zero cell is an
// "on" pixel, i.e. a candidate lane-boundary pixel produced by thresholding.

use crate::error::{LaneError, Result};
use image::GrayImage;
use ndarray::{s, Array1, Array2, Axis};

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryGrid {
    cells: Array2<u8>,
}

impl BinaryGrid {
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            cells: Array2::zeros((height, width)),
        }
    }

    pub fn from_array(cells: Array2<u8>) -> Self {
        Self { cells }
    }

    /// Build from row-major cells, `height * width` long.
    pub fn from_shape_vec(height: usize, width: usize, cells: Vec<u8>) -> Result<Self> {
        let expected = height * width;
        if cells.len() != expected {
            return Err(LaneError::GridShape {
                expected,
                actual: cells.len(),
            });
        }
        let cells = Array2::from_shape_vec((height, width), cells).map_err(|_| {
            LaneError::GridShape {
                expected,
                actual: expected,
            }
        })?;
        Ok(Self { cells })
    }

    /// Non-zero luma counts as on.
    pub fn from_luma(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let cells = Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
            u8::from(img.get_pixel(x as u32, y as u32)[0] != 0)
        });
        Self { cells }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    #[inline]
    pub fn is_on(&self, y: usize, x: usize) -> bool {
        self.cells[[y, x]] != 0
    }

    pub fn set(&mut self, y: usize, x: usize, on: bool) {
        self.cells[[y, x]] = u8::from(on);
    }

    pub fn count_on(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0).count()
    }

    pub fn cells(&self) -> &Array2<u8> {
        &self.cells
    }

    /// Column-wise count of on pixels over the bottom half of the grid.
    pub fn bottom_half_histogram(&self) -> Array1<u32> {
        let half = self.height() / 2;
        self.cells
            .slice(s![half.., ..])
            .mapv(|v| u32::from(v != 0))
            .sum_axis(Axis(0))
    }
}

/// Index of the maximum value; ties resolve to the first occurrence.
pub fn argmax_first(values: &[u32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_bottom_half_only() {
        let mut grid = BinaryGrid::zeros(10, 4);
        // Top half: should be ignored
        grid.set(0, 0, true);
        grid.set(4, 0, true);
        // Bottom half
        grid.set(5, 1, true);
        grid.set(9, 1, true);
        grid.set(7, 3, true);

        let hist = grid.bottom_half_histogram();
        assert_eq!(hist.to_vec(), vec![0, 2, 0, 1]);
    }

    #[test]
    fn test_argmax_first_occurrence() {
        assert_eq!(argmax_first(&[1, 5, 3, 5]), 1);
        assert_eq!(argmax_first(&[0, 0, 0]), 0);
        assert_eq!(argmax_first(&[2]), 0);
    }

    #[test]
    fn test_from_shape_vec_mismatch() {
        let result = BinaryGrid::from_shape_vec(3, 3, vec![0; 8]);
        assert_eq!(
            result,
            Err(LaneError::GridShape {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn test_from_luma_thresholds_nonzero() {
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(2, 1, image::Luma([255]));
        img.put_pixel(0, 0, image::Luma([1]));
        let grid = BinaryGrid::from_luma(&img);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 3);
        assert!(grid.is_on(1, 2));
        assert!(grid.is_on(0, 0));
        assert_eq!(grid.count_on(), 2);
    }
}
