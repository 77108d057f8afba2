// src/tracking/geometry.rs
//
// Real-world curvature radius and lane-center offset from meter-unit fits.
//
// Both quantities are evaluated at the bottom of the frame,
// y_eval = height · ym_per_pix.
//
// Offset sign convention:
//   offset = lane midpoint − vehicle position (frame center).
//   Positive → the lane center lies to the right of the vehicle, i.e. the
//   vehicle sits LEFT of center. Negative → vehicle sits RIGHT of center.
//   Exactly zero is reported as centered.

use super::curve::CurveModel;
use crate::error::{LaneError, Result};
use serde::Serialize;

/// Radius of curvature R = (1 + (2a·y + b)²)^1.5 / |2a| at `y_eval`.
///
/// `DegenerateCurvature` when a == 0 or the radius is not finite; callers
/// treat it like an implausible fit.
pub fn curvature_radius(fit: &CurveModel, y_eval: f64) -> Result<f64> {
    if fit.a == 0.0 {
        return Err(LaneError::DegenerateCurvature { a: fit.a });
    }
    let slope = 2.0 * fit.a * y_eval + fit.b;
    let radius = (1.0 + slope * slope).powf(1.5) / (2.0 * fit.a).abs();
    if radius.is_finite() {
        Ok(radius)
    } else {
        Err(LaneError::DegenerateCurvature { a: fit.a })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OffsetSide {
    Left,
    Right,
    Center,
}

impl OffsetSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

/// Vehicle position relative to the lane center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaneOffset {
    /// Lane midpoint minus vehicle position, meters.
    pub meters: f64,
    /// Side of the lane center the vehicle is on.
    pub side: OffsetSide,
}

impl LaneOffset {
    pub fn from_signed(meters: f64) -> Self {
        let side = if meters > 0.0 {
            OffsetSide::Left
        } else if meters < 0.0 {
            OffsetSide::Right
        } else {
            OffsetSide::Center
        };
        Self { meters, side }
    }

    pub fn distance(&self) -> f64 {
        self.meters.abs()
    }
}

impl std::fmt::Display for LaneOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.side {
            OffsetSide::Center => write!(f, "at center"),
            side => write!(f, "{:.2} m {} of center", self.distance(), side.as_str()),
        }
    }
}

/// Offset of a vehicle at `frame_width_m / 2` from the lane midpoint.
pub fn lane_offset(
    left: &CurveModel,
    right: &CurveModel,
    y_eval: f64,
    frame_width_m: f64,
) -> LaneOffset {
    let line_left = left.x_at(y_eval);
    let line_right = right.x_at(y_eval);
    let midpoint = line_left + (line_right - line_left) / 2.0;
    let vehicle = frame_width_m / 2.0;
    LaneOffset::from_signed(midpoint - vehicle)
}

/// Closed lane polygon in warped pixel space: left curve top → bottom, then
/// right curve bottom → top. One vertex per row.
pub fn lane_polygon(left: &CurveModel, right: &CurveModel, height: usize) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(height * 2);
    for y in 0..height {
        let y = y as f64;
        points.push((left.x_at(y), y));
    }
    for y in (0..height).rev() {
        let y = y as f64;
        points.push((right.x_at(y), y));
    }
    points
}
