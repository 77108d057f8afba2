// src/tracking/lane_track.rs
//
// Per-side tracking state. Owned exclusively by the FrameController and
// mutated once per frame; never shared.

use super::curve::{fit_quadratic, CurveModel, LaneFit, PixelSamples, PixelScale};
use crate::error::Result;
use crate::types::{LaneSide, TrackingConfig};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackState {
    /// No usable fit; the next frame runs the full sliding-window search.
    Undetected,
    /// Following the previous fit with the cheaper margin search.
    Tracking,
}

impl TrackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undetected => "UNDETECTED",
            Self::Tracking => "TRACKING",
        }
    }
}

/// Result of recording a search failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Failure counted; the previous fit stays in use.
    Counted(u32),
    /// Threshold reached, track returned to its initial state.
    Reset,
}

/// An accepted fit together with its curvature radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaneEstimate {
    pub pixel: CurveModel,
    pub meters: CurveModel,
    pub radius_m: f64,
}

#[derive(Debug, Clone)]
pub struct LaneTrack {
    side: LaneSide,
    history_len: usize,
    failure_threshold: u32,

    detected: bool,
    current_fit: Option<LaneFit>,
    radius_m: Option<f64>,
    /// Recent pixel fits, newest last.
    history: VecDeque<CurveModel>,
    /// (prev - curr) / prev between the two most recent fits.
    coefficient_delta: [f64; 3],
    consecutive_failures: u32,
}

impl LaneTrack {
    pub fn new(side: LaneSide, config: &TrackingConfig) -> Self {
        Self {
            side,
            history_len: config.history_len.max(1),
            failure_threshold: config.failure_threshold.max(1),
            detected: false,
            current_fit: None,
            radius_m: None,
            history: VecDeque::with_capacity(config.history_len.max(1)),
            coefficient_delta: [0.0; 3],
            consecutive_failures: 0,
        }
    }

    /// Accept a fresh fit that passed the plausibility gate.
    pub fn record_fit(&mut self, fit: LaneFit, radius_m: f64) {
        let newest = fit.pixel;
        if let Some(prev) = self.history.back() {
            let p = prev.coefficients();
            let c = newest.coefficients();
            // Zero previous coefficients give non-finite entries.
            self.coefficient_delta = [
                (p[0] - c[0]) / p[0],
                (p[1] - c[1]) / p[1],
                (p[2] - c[2]) / p[2],
            ];
        }

        self.history.push_back(newest);
        while self.history.len() > self.history_len {
            self.history.pop_front();
        }

        debug!(
            "  {} fit: a={:.3e} b={:.4} c={:.1} | R={:.0}m | pts={} rmse={:.2}px",
            self.side,
            newest.a,
            newest.b,
            newest.c,
            radius_m,
            fit.samples.len(),
            fit.rmse_px
        );

        self.current_fit = Some(fit);
        self.radius_m = Some(radius_m);
        self.detected = true;
        self.consecutive_failures = 0;
    }

    /// Count a failed search. Resets the track once the threshold is hit.
    ///
    /// A track that never held a fit has nothing to reset; its failures keep
    /// counting and are always reported as `Counted`.
    pub fn record_failure(&mut self) -> FailureOutcome {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.current_fit.is_none() && !self.detected {
            debug!(
                "{} lane still not found ({} searches)",
                self.side, self.consecutive_failures
            );
            return FailureOutcome::Counted(self.consecutive_failures);
        }
        if self.consecutive_failures >= self.failure_threshold {
            warn!(
                "{} lane lost after {} consecutive failures, resetting track",
                self.side, self.consecutive_failures
            );
            self.reset();
            FailureOutcome::Reset
        } else {
            debug!(
                "{} lane search failed ({}/{})",
                self.side, self.consecutive_failures, self.failure_threshold
            );
            FailureOutcome::Counted(self.consecutive_failures)
        }
    }

    /// Return to the freshly created state.
    pub fn reset(&mut self) {
        self.detected = false;
        self.current_fit = None;
        self.radius_m = None;
        self.history.clear();
        self.coefficient_delta = [0.0; 3];
        self.consecutive_failures = 0;
    }

    pub fn side(&self) -> LaneSide {
        self.side
    }

    pub fn state(&self) -> TrackState {
        if self.detected {
            TrackState::Tracking
        } else {
            TrackState::Undetected
        }
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    pub fn current_fit(&self) -> Option<&LaneFit> {
        self.current_fit.as_ref()
    }

    pub fn radius_m(&self) -> Option<f64> {
        self.radius_m
    }

    /// Last accepted fit and its radius, if any.
    pub fn estimate(&self) -> Option<LaneEstimate> {
        let fit = self.current_fit.as_ref()?;
        Some(LaneEstimate {
            pixel: fit.pixel,
            meters: fit.meters,
            radius_m: self.radius_m?,
        })
    }

    /// Coefficient-wise mean of the history.
    pub fn best_fit(&self) -> Option<CurveModel> {
        CurveModel::mean_of(self.history.iter())
    }

    pub fn history(&self) -> impl Iterator<Item = &CurveModel> {
        self.history.iter()
    }

    pub fn history_size(&self) -> usize {
        self.history.len()
    }

    pub fn coefficient_delta(&self) -> [f64; 3] {
        self.coefficient_delta
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Pixel coordinates behind the current fit.
    pub fn sample_points(&self) -> Option<&PixelSamples> {
        self.current_fit.as_ref().map(|f| &f.samples)
    }

    /// Refit the retained samples in real-world units with another scale.
    pub fn refit_in_meters(&self, scale: &PixelScale) -> Option<Result<CurveModel>> {
        let samples = self.sample_points()?;
        let xs: Vec<f64> = samples
            .xs
            .iter()
            .map(|&x| x as f64 * scale.xm_per_pix)
            .collect();
        let ys: Vec<f64> = samples
            .ys
            .iter()
            .map(|&y| y as f64 * scale.ym_per_pix)
            .collect();
        Some(fit_quadratic(&xs, &ys))
    }
}
