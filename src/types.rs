// src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub search: SearchConfig,
    pub tracking: TrackingConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

/// Meter-per-pixel constants of the warped bird's-eye frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub xm_per_pix: f64,
    pub ym_per_pix: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            xm_per_pix: 3.7 / 700.0,
            ym_per_pix: 30.0 / 720.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of horizontal bands scanned by the sliding-window search.
    pub window_count: usize,
    /// Half-width of each sliding window, in pixels.
    pub margin: usize,
    /// Pixels a window must collect before the next window is recentered.
    pub min_pixels_to_recenter: usize,
    /// Half-width of the band around the prior curve used by tracked search.
    pub tracked_margin: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            window_count: 9,
            margin: 100,
            min_pixels_to_recenter: 50,
            tracked_margin: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Fits kept per side for the smoothed best fit.
    pub history_len: usize,
    /// Consecutive search failures before a track resets.
    pub failure_threshold: u32,
    /// Curvature radius (meters) above which a fresh fit is discarded.
    pub curvature_ceiling_m: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            history_len: 5,
            failure_threshold: 5,
            curvature_ceiling_m: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub input_dir: String,
    pub debug_dir: Option<String>,
    pub report_path: Option<String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            input_dir: "masks".to_string(),
            debug_dir: None,
            report_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneSide {
    Left,
    Right,
}

impl LaneSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for LaneSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
