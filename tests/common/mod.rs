#![allow(dead_code)]

use lane_tracker::{BinaryGrid, CurveModel};

pub const HEIGHT: usize = 720;
pub const WIDTH: usize = 1280;
pub const XM_PER_PIX: f64 = 3.7 / 700.0;
pub const YM_PER_PIX: f64 = 30.0 / 720.0;

/// Pixel-space leading coefficient giving radius `r` meters at the bottom row
/// of a boundary with zero slope there.
pub fn a_for_radius(r: f64) -> f64 {
    YM_PER_PIX * YM_PER_PIX / (2.0 * r * XM_PER_PIX)
}

/// x = a·(y − HEIGHT)² + x_bottom: curved boundary, vertical at the bottom.
pub fn bend(radius_m: f64, x_bottom: f64) -> CurveModel {
    let a = a_for_radius(radius_m);
    let h = HEIGHT as f64;
    CurveModel::new(a, -2.0 * a * h, a * h * h + x_bottom)
}

/// Rasterize boundaries `thickness` pixels wide, starting at the rounded x.
pub fn road(curves: &[CurveModel], thickness: usize) -> BinaryGrid {
    let mut grid = BinaryGrid::zeros(HEIGHT, WIDTH);
    for curve in curves {
        for y in 0..HEIGHT {
            let x = curve.x_at(y as f64).round();
            if x < 0.0 {
                continue;
            }
            for dx in 0..thickness {
                let xi = x as usize + dx;
                if xi < WIDTH {
                    grid.set(y, xi, true);
                }
            }
        }
    }
    grid
}

pub fn vertical_lines(xs: &[usize]) -> BinaryGrid {
    let mut grid = BinaryGrid::zeros(HEIGHT, WIDTH);
    for y in 0..HEIGHT {
        for &x in xs {
            grid.set(y, x, true);
        }
    }
    grid
}
