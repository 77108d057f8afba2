// src/error.rs

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LaneError {
    /// Too few distinct rows to fit a quadratic, or the fit was numerically singular.
    #[error("insufficient pixels for a lane fit: {distinct_rows} distinct rows, need 3")]
    InsufficientPixels { distinct_rows: usize },

    /// Leading coefficient is zero or the radius overflowed.
    #[error("degenerate curvature (a = {a:e})")]
    DegenerateCurvature { a: f64 },

    #[error("grid shape mismatch: expected {expected} cells, got {actual}")]
    GridShape { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LaneError>;
