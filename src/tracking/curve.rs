// src/tracking/curve.rs
//
// Quadratic lane boundary model x = a·y² + b·y + c and its least-squares fit.
//
// Coordinate system:
//   y is the image row (increases downward), x the image column, both in the
//   warped bird's-eye frame. The same model is used in real-world units by
//   scaling the sample points with the meter-per-pixel constants BEFORE
//   fitting, so pixel and meter variants always come from identical points.

use crate::error::{LaneError, Result};
use crate::types::CameraConfig;
use serde::{Deserialize, Serialize};

/// Singular-pivot threshold for the normalized normal equations.
const PIVOT_EPS: f64 = 1e-12;

/// Quadratic x = a·y² + b·y + c.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveModel {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl CurveModel {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub fn from_coefficients(coeffs: [f64; 3]) -> Self {
        Self::new(coeffs[0], coeffs[1], coeffs[2])
    }

    pub fn coefficients(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    #[inline]
    pub fn x_at(&self, y: f64) -> f64 {
        self.a * y * y + self.b * y + self.c
    }

    /// Coefficient-wise mean. None for an empty input.
    pub fn mean_of<'a, I>(models: I) -> Option<CurveModel>
    where
        I: IntoIterator<Item = &'a CurveModel>,
    {
        let mut sum = [0.0f64; 3];
        let mut n = 0usize;
        for m in models {
            sum[0] += m.a;
            sum[1] += m.b;
            sum[2] += m.c;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        let n = n as f64;
        Some(CurveModel::new(sum[0] / n, sum[1] / n, sum[2] / n))
    }
}

/// Meter-per-pixel scale of the warped frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale {
    pub xm_per_pix: f64,
    pub ym_per_pix: f64,
}

impl From<&CameraConfig> for PixelScale {
    fn from(camera: &CameraConfig) -> Self {
        Self {
            xm_per_pix: camera.xm_per_pix,
            ym_per_pix: camera.ym_per_pix,
        }
    }
}

/// Pixel coordinates collected for one lane boundary, in collection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelSamples {
    pub xs: Vec<usize>,
    pub ys: Vec<usize>,
}

impl PixelSamples {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, x: usize, y: usize) {
        self.xs.push(x);
        self.ys.push(y);
    }

    pub fn extend(&mut self, other: &PixelSamples) {
        self.xs.extend_from_slice(&other.xs);
        self.ys.extend_from_slice(&other.ys);
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Number of distinct rows among the samples.
    pub fn distinct_rows(&self) -> usize {
        let mut rows = self.ys.clone();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    }

    fn scaled(&self, sx: f64, sy: f64) -> (Vec<f64>, Vec<f64>) {
        let xs = self.xs.iter().map(|&x| x as f64 * sx).collect();
        let ys = self.ys.iter().map(|&y| y as f64 * sy).collect();
        (xs, ys)
    }
}

/// A boundary fit in both pixel and real-world units.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneFit {
    pub pixel: CurveModel,
    pub meters: CurveModel,
    /// RMS residual of the pixel fit.
    pub rmse_px: f64,
    pub samples: PixelSamples,
}

impl LaneFit {
    /// Fit both variants from the same sample points.
    pub fn from_samples(samples: PixelSamples, scale: &PixelScale) -> Result<Self> {
        let (xs, ys) = samples.scaled(1.0, 1.0);
        let pixel = fit_quadratic(&xs, &ys)?;

        let (xs_m, ys_m) = samples.scaled(scale.xm_per_pix, scale.ym_per_pix);
        let meters = fit_quadratic(&xs_m, &ys_m)?;

        let sse: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(&x, &y)| {
                let r = x - pixel.x_at(y);
                r * r
            })
            .sum();
        let rmse_px = (sse / xs.len() as f64).sqrt();

        Ok(Self {
            pixel,
            meters,
            rmse_px,
            samples,
        })
    }
}

/// Least-squares fit of x = a·y² + b·y + c.
///
/// y is normalized to [0, 1] before building the normal equations and the
/// solution is mapped back to raw y. Fewer than 3 distinct y values, a
/// singular system or a non-finite solution all yield `InsufficientPixels`.
pub fn fit_quadratic(xs: &[f64], ys: &[f64]) -> Result<CurveModel> {
    let n = xs.len().min(ys.len());

    let mut rows: Vec<f64> = ys[..n].to_vec();
    rows.sort_by(|a, b| a.total_cmp(b));
    rows.dedup();
    let distinct_rows = rows.len();
    if distinct_rows < 3 {
        return Err(LaneError::InsufficientPixels { distinct_rows });
    }

    let y_min = rows[0];
    let y_range = rows[distinct_rows - 1] - y_min;
    if !(y_range.is_finite() && y_range > 0.0) {
        return Err(LaneError::InsufficientPixels { distinct_rows });
    }

    let mut s1 = 0.0f64;
    let mut s2 = 0.0f64;
    let mut s3 = 0.0f64;
    let mut s4 = 0.0f64;
    let mut sx0 = 0.0f64;
    let mut sx1 = 0.0f64;
    let mut sx2 = 0.0f64;

    for (&x, &y) in xs[..n].iter().zip(&ys[..n]) {
        let t = (y - y_min) / y_range;
        let t2 = t * t;
        s1 += t;
        s2 += t2;
        s3 += t2 * t;
        s4 += t2 * t2;
        sx0 += x;
        sx1 += x * t;
        sx2 += x * t2;
    }

    //   | s4 s3 s2 | | A |   | sx2 |
    //   | s3 s2 s1 | | B | = | sx1 |
    //   | s2 s1 n  | | C |   | sx0 |
    let (ta, tb, tc) = solve_3x3(
        [s4, s3, s2, s3, s2, s1, s2, s1, n as f64],
        [sx2, sx1, sx0],
    )
    .ok_or(LaneError::InsufficientPixels { distinct_rows })?;

    // Undo t = (y - y_min) / y_range.
    let r2 = y_range * y_range;
    let a = ta / r2;
    let b = tb / y_range - 2.0 * ta * y_min / r2;
    let c = ta * y_min * y_min / r2 - tb * y_min / y_range + tc;

    if a.is_finite() && b.is_finite() && c.is_finite() {
        Ok(CurveModel::new(a, b, c))
    } else {
        Err(LaneError::InsufficientPixels { distinct_rows })
    }
}

/// Solve a 3×3 linear system by Gaussian elimination with partial pivoting.
/// Matrix is row-major. Returns None if the system is singular.
fn solve_3x3(mat: [f64; 9], rhs: [f64; 3]) -> Option<(f64, f64, f64)> {
    // Augmented matrix [A|b]
    let mut m = [
        [mat[0], mat[1], mat[2], rhs[0]],
        [mat[3], mat[4], mat[5], rhs[1]],
        [mat[6], mat[7], mat[8], rhs[2]],
    ];

    // Forward elimination with partial pivoting
    for col in 0..3 {
        // Find pivot
        let mut max_val = m[col][col].abs();
        let mut max_row = col;
        for (row, r) in m.iter().enumerate().skip(col + 1) {
            if r[col].abs() > max_val {
                max_val = r[col].abs();
                max_row = row;
            }
        }

        if !(max_val >= PIVOT_EPS) {
            return None; // Singular (or NaN)
        }

        // Swap rows
        if max_row != col {
            m.swap(col, max_row);
        }

        // Eliminate below
        for row in (col + 1)..3 {
            let factor = m[row][col] / m[col][col];
            for j in col..4 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    // Back substitution
    let c = m[2][3] / m[2][2];
    let b = (m[1][3] - m[1][2] * c) / m[1][1];
    let a = (m[0][3] - m[0][2] * c - m[0][1] * b) / m[0][0];

    if a.is_finite() && b.is_finite() && c.is_finite() {
        Some((a, b, c))
    } else {
        None
    }
}
