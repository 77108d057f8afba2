// src/debug.rs
//
// Visualization of a search in warped space. Not needed for tracking.

use crate::grid::BinaryGrid;
use crate::tracking::{CurveModel, LaneFit, SearchWindow};
use image::{Rgb, RgbImage};

const ON_PIXEL: Rgb<u8> = Rgb([255, 255, 255]);
const WINDOW: Rgb<u8> = Rgb([0, 255, 0]);
const LEFT_SAMPLE: Rgb<u8> = Rgb([255, 0, 0]);
const RIGHT_SAMPLE: Rgb<u8> = Rgb([0, 0, 255]);
const CURVE: Rgb<u8> = Rgb([255, 255, 0]);

/// Grid pixels in white, scanned windows in green, each side's samples in
/// red/blue and the fitted curves in yellow.
pub fn render_search(
    grid: &BinaryGrid,
    windows: &[SearchWindow],
    left: Option<&LaneFit>,
    right: Option<&LaneFit>,
) -> RgbImage {
    let (w, h) = (grid.width() as u32, grid.height() as u32);
    let mut img = RgbImage::new(w, h);

    for ((y, x), &v) in grid.cells().indexed_iter() {
        if v != 0 {
            img.put_pixel(x as u32, y as u32, ON_PIXEL);
        }
    }

    for (fit, color) in [(left, LEFT_SAMPLE), (right, RIGHT_SAMPLE)] {
        if let Some(fit) = fit {
            for (&x, &y) in fit.samples.xs.iter().zip(&fit.samples.ys) {
                put_clipped(&mut img, x as i64, y as i64, color);
            }
        }
    }

    for window in windows {
        draw_rect(
            &mut img,
            window.x_low,
            window.y_low as i64,
            window.x_high,
            window.y_high as i64 - 1,
            WINDOW,
        );
    }

    for fit in [left, right].into_iter().flatten() {
        draw_curve(&mut img, &fit.pixel, CURVE);
    }

    img
}

/// One dot per row along the curve.
pub fn draw_curve(img: &mut RgbImage, curve: &CurveModel, color: Rgb<u8>) {
    for y in 0..img.height() {
        let x = curve.x_at(y as f64).round();
        if x.is_finite() {
            put_clipped(img, x as i64, y as i64, color);
        }
    }
}

/// Outline with inclusive corners, clipped to the image.
fn draw_rect(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    for x in x0..=x1 {
        put_clipped(img, x, y0, color);
        put_clipped(img, x, y1, color);
    }
    for y in y0..=y1 {
        put_clipped(img, x0, y, color);
        put_clipped(img, x1, y, color);
    }
}

fn put_clipped(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= img.width() || uy >= img.height() {
        return;
    }
    img.put_pixel(ux, uy, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{initial_search, PixelScale};
    use crate::types::SearchConfig;

    #[test]
    fn test_render_marks_windows_and_samples() {
        let mut grid = BinaryGrid::zeros(90, 200);
        for y in 0..90 {
            grid.set(y, 40, true);
            grid.set(y, 150, true);
        }
        let config = SearchConfig {
            window_count: 3,
            margin: 10,
            min_pixels_to_recenter: 5,
            tracked_margin: 10,
        };
        let scale = PixelScale {
            xm_per_pix: 0.01,
            ym_per_pix: 0.05,
        };
        let search = initial_search(&grid, &config, &scale);
        let left = search.left.as_ref().ok();
        let right = search.right.as_ref().ok();
        let img = render_search(&grid, &search.windows, left, right);

        assert_eq!(img.dimensions(), (200, 90));
        // Window border of the bottom-left band
        assert_eq!(*img.get_pixel(30, 89), WINDOW);
        // Interior of a window with no pixels stays black
        assert_eq!(*img.get_pixel(35, 70), Rgb([0, 0, 0]));
        // Fitted curve drawn over the samples
        assert_eq!(*img.get_pixel(40, 45), CURVE);
    }

    #[test]
    fn test_draw_rect_clips() {
        let mut img = RgbImage::new(10, 10);
        draw_rect(&mut img, -5, -5, 3, 3, WINDOW);
        assert_eq!(*img.get_pixel(3, 0), WINDOW);
        assert_eq!(*img.get_pixel(0, 3), WINDOW);
        assert_eq!(*img.get_pixel(1, 1), Rgb([0, 0, 0]));
    }
}
