// src/tracking/frame_controller.rs
//
// Per-frame orchestration of both lane tracks.
//
// State machine (per side):
//   UNDETECTED ──initial search ok──▶ TRACKING
//   TRACKING   ──tracked search ok──▶ TRACKING (history push, failures = 0)
//   any        ──search failed──────▶ same state, failures += 1, previous fit
//                                     reused; at the threshold the track
//                                     resets to UNDETECTED with no fit.
//
// If either side is UNDETECTED the joint sliding-window search runs for both.
//
// Plausibility gate (after every successful fit): a fresh fit whose radius
// exceeds the ceiling, or whose curvature is degenerate, is discarded for
// this frame. The previous accepted fit is emitted instead. This is NOT a
// search failure: the counter and the detected flag are untouched.

use super::curve::{LaneFit, PixelScale};
use super::geometry::{curvature_radius, lane_offset, LaneOffset};
use super::initial_search::{initial_search, SearchWindow};
use super::lane_track::{FailureOutcome, LaneEstimate, LaneTrack};
use super::tracked_search::tracked_search;
use crate::error::Result;
use crate::grid::BinaryGrid;
use crate::types::{CameraConfig, Config, LaneSide, SearchConfig, TrackingConfig};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackerConfig {
    pub camera: CameraConfig,
    pub search: SearchConfig,
    pub tracking: TrackingConfig,
}

impl From<&Config> for TrackerConfig {
    fn from(config: &Config) -> Self {
        Self {
            camera: config.camera,
            search: config.search,
            tracking: config.tracking,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchKind {
    /// Histogram + sliding windows over the full frame.
    Initial,
    /// Margin band around each side's previous fit.
    Tracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum HoldReason {
    /// Search found too few pixels.
    SearchFailed,
    /// Fresh fit flatter than the plausibility ceiling.
    ImplausibleCurvature { radius_m: f64 },
    /// Fresh fit had a zero leading coefficient.
    DegenerateCurvature,
    /// Failure threshold reached on this frame; track was cleared.
    TrackReset,
}

/// What a side reports for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LaneReading {
    /// Fit found and accepted this frame.
    Fresh(LaneEstimate),
    /// This frame's fit was missing or rejected; previous estimate reused.
    Held {
        estimate: LaneEstimate,
        reason: HoldReason,
    },
    /// No lane data for this side on this frame.
    Unavailable { reason: HoldReason },
}

impl LaneReading {
    pub fn estimate(&self) -> Option<&LaneEstimate> {
        match self {
            Self::Fresh(estimate) | Self::Held { estimate, .. } => Some(estimate),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    pub search: SearchKind,
    pub left: LaneReading,
    pub right: LaneReading,
    /// Present only when both sides have an estimate.
    pub offset: Option<LaneOffset>,
}

impl FrameReport {
    pub fn has_lane_data(&self) -> bool {
        self.left.estimate().is_some() && self.right.estimate().is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub frames: u64,
    pub initial_searches: u64,
    pub tracked_searches: u64,
    pub accepted_fits: u64,
    pub rejected_fits: u64,
    pub search_failures: u64,
    pub track_resets: u64,
}

pub struct FrameController {
    config: TrackerConfig,
    scale: PixelScale,
    left: LaneTrack,
    right: LaneTrack,
    frame_index: u64,
    stats: TrackerStats,
    /// Windows of the most recent initial search, empty after a tracked one.
    last_windows: Vec<SearchWindow>,
}

impl FrameController {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            scale: PixelScale::from(&config.camera),
            left: LaneTrack::new(LaneSide::Left, &config.tracking),
            right: LaneTrack::new(LaneSide::Right, &config.tracking),
            frame_index: 0,
            stats: TrackerStats::default(),
            last_windows: Vec::new(),
            config,
        }
    }

    /// Run one frame through search → fit → gate → curvature → offset.
    pub fn process(&mut self, grid: &BinaryGrid) -> FrameReport {
        let frame_index = self.frame_index;
        self.frame_index += 1;
        self.stats.frames += 1;

        let (search, left_fresh, right_fresh) = self.search(grid);

        let y_eval = grid.height() as f64 * self.scale.ym_per_pix;
        let ceiling = self.config.tracking.curvature_ceiling_m;

        let left = settle(&mut self.left, left_fresh, y_eval, ceiling, &mut self.stats);
        let right = settle(&mut self.right, right_fresh, y_eval, ceiling, &mut self.stats);

        let offset = match (left.estimate(), right.estimate()) {
            (Some(l), Some(r)) => {
                let frame_width_m = grid.width() as f64 * self.scale.xm_per_pix;
                Some(lane_offset(&l.meters, &r.meters, y_eval, frame_width_m))
            }
            _ => None,
        };

        debug!(
            "Frame {} [{:?}] left={} right={} offset={}",
            frame_index,
            search,
            describe(&left),
            describe(&right),
            offset.map_or_else(|| "n/a".to_string(), |o| o.to_string())
        );

        FrameReport {
            frame_index,
            search,
            left,
            right,
            offset,
        }
    }

    fn search(&mut self, grid: &BinaryGrid) -> (SearchKind, Result<LaneFit>, Result<LaneFit>) {
        let prior = match (self.left.current_fit(), self.right.current_fit()) {
            (Some(l), Some(r)) if self.left.is_detected() && self.right.is_detected() => {
                Some((l.pixel, r.pixel))
            }
            _ => None,
        };

        match prior {
            Some((left_prior, right_prior)) => {
                self.stats.tracked_searches += 1;
                self.last_windows.clear();
                let margin = self.config.search.tracked_margin;
                (
                    SearchKind::Tracked,
                    tracked_search(grid, &left_prior, margin, &self.scale),
                    tracked_search(grid, &right_prior, margin, &self.scale),
                )
            }
            None => {
                self.stats.initial_searches += 1;
                debug!(
                    "Initial search (left {}, right {})",
                    self.left.state().as_str(),
                    self.right.state().as_str()
                );
                let found = initial_search(grid, &self.config.search, &self.scale);
                self.last_windows = found.windows;
                (SearchKind::Initial, found.left, found.right)
            }
        }
    }

    pub fn left(&self) -> &LaneTrack {
        &self.left
    }

    pub fn right(&self) -> &LaneTrack {
        &self.right
    }

    pub fn track(&self, side: LaneSide) -> &LaneTrack {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }

    pub fn last_windows(&self) -> &[SearchWindow] {
        &self.last_windows
    }

    pub fn stats(&self) -> &TrackerStats {
        &self.stats
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    /// Forget both tracks (e.g. on a scene cut).
    pub fn reset(&mut self) {
        info!("Resetting both lane tracks");
        self.left.reset();
        self.right.reset();
    }
}

/// Apply the failure counter and plausibility gate to one side's search result.
fn settle(
    track: &mut LaneTrack,
    fresh: Result<LaneFit>,
    y_eval: f64,
    ceiling: f64,
    stats: &mut TrackerStats,
) -> LaneReading {
    let fit = match fresh {
        Ok(fit) => fit,
        Err(err) => {
            stats.search_failures += 1;
            debug!("{} search failed: {}", track.side(), err);
            return match track.record_failure() {
                FailureOutcome::Counted(_) => hold(track, HoldReason::SearchFailed),
                FailureOutcome::Reset => {
                    stats.track_resets += 1;
                    LaneReading::Unavailable {
                        reason: HoldReason::TrackReset,
                    }
                }
            };
        }
    };

    match curvature_radius(&fit.meters, y_eval) {
        Ok(radius_m) if radius_m <= ceiling => {
            stats.accepted_fits += 1;
            track.record_fit(fit, radius_m);
            match track.estimate() {
                Some(estimate) => LaneReading::Fresh(estimate),
                None => LaneReading::Unavailable {
                    reason: HoldReason::SearchFailed,
                },
            }
        }
        Ok(radius_m) => {
            stats.rejected_fits += 1;
            debug!(
                "{} fit rejected: R={:.0}m above {:.0}m ceiling",
                track.side(),
                radius_m,
                ceiling
            );
            hold(track, HoldReason::ImplausibleCurvature { radius_m })
        }
        // curvature_radius fails only with DegenerateCurvature.
        Err(err) => {
            stats.rejected_fits += 1;
            debug!("{} fit rejected: {}", track.side(), err);
            hold(track, HoldReason::DegenerateCurvature)
        }
    }
}

fn hold(track: &LaneTrack, reason: HoldReason) -> LaneReading {
    match track.estimate() {
        Some(estimate) => LaneReading::Held { estimate, reason },
        None => LaneReading::Unavailable { reason },
    }
}

fn describe(reading: &LaneReading) -> String {
    match reading {
        LaneReading::Fresh(e) => format!("R={:.0}m", e.radius_m),
        LaneReading::Held { estimate, reason } => {
            format!("R={:.0}m (held: {:?})", estimate.radius_m, reason)
        }
        LaneReading::Unavailable { reason } => format!("none ({:?})", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::curve::{CurveModel, PixelSamples};
    use crate::tracking::lane_track::TrackState;

    const H: usize = 720;
    const W: usize = 1280;

    /// Lane boundary with zero slope at the bottom row:
    /// x = a·(y − 720)² + x_bottom. R ≈ 1 / (6.09·a) meters.
    fn bend(a: f64, x_bottom: f64) -> CurveModel {
        CurveModel::new(a, -2.0 * a * H as f64, a * (H * H) as f64 + x_bottom)
    }

    fn draw(curves: &[CurveModel]) -> BinaryGrid {
        let mut grid = BinaryGrid::zeros(H, W);
        for curve in curves {
            for y in 0..H {
                let x = curve.x_at(y as f64).round() as usize;
                for dx in 0..5 {
                    grid.set(y, x + dx, true);
                }
            }
        }
        grid
    }

    fn curved_grid() -> BinaryGrid {
        draw(&[bend(2e-4, 300.0), bend(2e-4, 900.0)])
    }

    fn straight_grid() -> BinaryGrid {
        let mut grid = BinaryGrid::zeros(H, W);
        for y in 0..H {
            grid.set(y, 300, true);
            grid.set(y, 900, true);
        }
        grid
    }

    #[test]
    fn test_first_frame_uses_initial_search() {
        let mut ctl = FrameController::new(TrackerConfig::default());
        let report = ctl.process(&curved_grid());
        assert_eq!(report.search, SearchKind::Initial);
        assert!(report.left.is_fresh() && report.right.is_fresh());
        assert_eq!(ctl.left().state(), TrackState::Tracking);
        assert_eq!(ctl.right().state(), TrackState::Tracking);

        let radius = report.left.estimate().unwrap().radius_m;
        assert!(
            (radius - 821.0).abs() < 60.0,
            "Expected R ≈ 821 m, got {:.1}",
            radius
        );
        assert!(report.offset.is_some());
    }

    #[test]
    fn test_second_frame_uses_tracked_search() {
        let mut ctl = FrameController::new(TrackerConfig::default());
        let grid = curved_grid();
        ctl.process(&grid);
        assert_eq!(ctl.last_windows().len(), 18);
        let report = ctl.process(&grid);
        assert_eq!(report.search, SearchKind::Tracked);
        assert!(report.left.is_fresh());
        assert_eq!(ctl.left().history_size(), 2);
        assert_eq!(ctl.stats().initial_searches, 1);
        assert_eq!(ctl.stats().tracked_searches, 1);
        assert!(ctl.last_windows().is_empty());
    }

    #[test]
    fn test_implausible_fit_holds_previous_estimate() {
        let mut ctl = FrameController::new(TrackerConfig::default());
        let first = ctl.process(&curved_grid());
        let prior_left = *first.left.estimate().unwrap();

        // Straight lines fit with a tiny but non-zero a: radius far above the ceiling
        let report = ctl.process(&straight_grid());
        match report.left {
            LaneReading::Held {
                estimate,
                reason: HoldReason::ImplausibleCurvature { radius_m },
            } => {
                assert_eq!(estimate, prior_left);
                assert!(radius_m > 10_000.0, "R = {:.0}", radius_m);
            }
            other => panic!("expected held reading, got {:?}", other),
        }
        assert_eq!(ctl.left().consecutive_failures(), 0);
        assert!(ctl.left().is_detected());
        assert_eq!(ctl.left().history_size(), 1);
        assert_eq!(ctl.stats().rejected_fits, 2);
    }

    /// Fit with an exactly zero leading coefficient in both unit systems.
    fn flat_fit(x: f64) -> LaneFit {
        LaneFit {
            pixel: CurveModel::new(0.0, 0.0, x),
            meters: CurveModel::new(0.0, 0.0, x * 3.7 / 700.0),
            rmse_px: 0.0,
            samples: PixelSamples::new(),
        }
    }

    fn curved_fit(x: f64) -> LaneFit {
        LaneFit {
            pixel: CurveModel::new(2e-4, -0.288, x),
            meters: CurveModel::new(6e-4, -0.01, x * 3.7 / 700.0),
            rmse_px: 0.0,
            samples: PixelSamples::new(),
        }
    }

    #[test]
    fn test_degenerate_fit_holds_previous_estimate() {
        let mut track = LaneTrack::new(LaneSide::Left, &TrackingConfig::default());
        track.record_fit(curved_fit(300.0), 820.0);
        let prior = track.estimate().unwrap();
        let mut stats = TrackerStats::default();

        let reading = settle(&mut track, Ok(flat_fit(310.0)), 30.0, 10_000.0, &mut stats);
        assert_eq!(
            reading,
            LaneReading::Held {
                estimate: prior,
                reason: HoldReason::DegenerateCurvature
            }
        );
        assert_eq!(track.consecutive_failures(), 0);
        assert!(track.is_detected());
        assert_eq!(track.history_size(), 1);
        assert_eq!(stats.rejected_fits, 1);
        assert_eq!(stats.search_failures, 0);
    }

    #[test]
    fn test_degenerate_fit_without_prior_is_unavailable() {
        let mut track = LaneTrack::new(LaneSide::Right, &TrackingConfig::default());
        let mut stats = TrackerStats::default();

        let reading = settle(&mut track, Ok(flat_fit(900.0)), 30.0, 10_000.0, &mut stats);
        assert_eq!(
            reading,
            LaneReading::Unavailable {
                reason: HoldReason::DegenerateCurvature
            }
        );
        assert_eq!(track.consecutive_failures(), 0);
        assert!(!track.is_detected());
        assert_eq!(track.history_size(), 0);
    }

    #[test]
    fn test_empty_frames_without_prior_never_reset() {
        let mut ctl = FrameController::new(TrackerConfig::default());
        let empty = BinaryGrid::zeros(H, W);
        for _ in 0..7 {
            let report = ctl.process(&empty);
            assert_eq!(report.search, SearchKind::Initial);
            assert_eq!(
                report.left,
                LaneReading::Unavailable {
                    reason: HoldReason::SearchFailed
                }
            );
        }
        assert_eq!(ctl.stats().track_resets, 0);
        assert_eq!(ctl.stats().search_failures, 14);
        assert_eq!(ctl.left().consecutive_failures(), 7);
    }

    #[test]
    fn test_rejection_without_prior_is_unavailable() {
        let mut ctl = FrameController::new(TrackerConfig::default());
        let report = ctl.process(&straight_grid());
        assert!(matches!(report.left, LaneReading::Unavailable { .. }));
        assert!(report.offset.is_none());
        assert!(!report.has_lane_data());
        // Still undetected, so the next frame searches from scratch again.
        assert_eq!(ctl.left().state(), TrackState::Undetected);
        assert_eq!(ctl.left().consecutive_failures(), 0);
    }

    #[test]
    fn test_failures_reuse_fit_then_reset() {
        let mut ctl = FrameController::new(TrackerConfig::default());
        let first = ctl.process(&curved_grid());
        let prior = *first.right.estimate().unwrap();
        let empty = BinaryGrid::zeros(H, W);

        for n in 1..5 {
            let report = ctl.process(&empty);
            assert_eq!(report.search, SearchKind::Tracked);
            assert_eq!(
                report.right,
                LaneReading::Held {
                    estimate: prior,
                    reason: HoldReason::SearchFailed
                }
            );
            assert_eq!(ctl.right().consecutive_failures(), n);
        }

        let report = ctl.process(&empty);
        assert_eq!(
            report.right,
            LaneReading::Unavailable {
                reason: HoldReason::TrackReset
            }
        );
        assert_eq!(ctl.right().state(), TrackState::Undetected);
        assert_eq!(ctl.right().history_size(), 0);
        assert_eq!(ctl.stats().track_resets, 2);

        // After the reset the empty grid goes through initial search and has
        // nothing to fall back on.
        let report = ctl.process(&empty);
        assert_eq!(report.search, SearchKind::Initial);
        assert_eq!(
            report.left,
            LaneReading::Unavailable {
                reason: HoldReason::SearchFailed
            }
        );
        assert!(report.offset.is_none());
    }

    #[test]
    fn test_recovers_after_reset() {
        let mut ctl = FrameController::new(TrackerConfig::default());
        let empty = BinaryGrid::zeros(H, W);
        ctl.process(&curved_grid());
        for _ in 0..5 {
            ctl.process(&empty);
        }
        let report = ctl.process(&curved_grid());
        assert_eq!(report.search, SearchKind::Initial);
        assert!(report.left.is_fresh() && report.right.is_fresh());
        assert_eq!(ctl.left().history_size(), 1);
    }

    #[test]
    fn test_centered_lane_offset_near_zero() {
        let mut ctl = FrameController::new(TrackerConfig::default());
        // Lines are 5 px wide, so the fitted centers sit at 292 and 988.
        let report = ctl.process(&draw(&[bend(2e-4, 290.0), bend(2e-4, 986.0)]));
        let offset = report.offset.unwrap();
        assert!(offset.meters.abs() < 0.02, "offset = {}", offset.meters);
    }

    #[test]
    fn test_ceiling_is_configurable() {
        let config = TrackerConfig {
            tracking: TrackingConfig {
                curvature_ceiling_m: 500.0,
                ..TrackingConfig::default()
            },
            ..TrackerConfig::default()
        };
        let mut ctl = FrameController::new(config);
        let report = ctl.process(&curved_grid());
        assert!(matches!(
            report.left,
            LaneReading::Unavailable {
                reason: HoldReason::ImplausibleCurvature { .. }
            }
        ));
    }
}
