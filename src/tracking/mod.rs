// src/tracking/mod.rs
//
// Lane-tracking core.
//
// Signal flow:
//   BinaryGrid → initial_search / tracked_search → LaneFit (pixel + meters)
//              → LaneTrack (history, failures) → geometry (radius, offset)
//
// Orchestrated by frame_controller::FrameController.

pub mod curve;
pub mod frame_controller;
pub mod geometry;
pub mod initial_search;
pub mod lane_track;
pub mod tracked_search;

pub use curve::{fit_quadratic, CurveModel, LaneFit, PixelSamples, PixelScale};
pub use frame_controller::{
    FrameController, FrameReport, HoldReason, LaneReading, SearchKind, TrackerConfig,
    TrackerStats,
};
pub use geometry::{curvature_radius, lane_offset, lane_polygon, LaneOffset, OffsetSide};
pub use initial_search::{find_lane_bases, initial_search, InitialSearch, SearchWindow};
pub use lane_track::{FailureOutcome, LaneEstimate, LaneTrack, TrackState};
pub use tracked_search::{collect_band, tracked_search};
