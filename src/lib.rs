//! Lane boundary tracking on binarized, perspective-warped road frames.
//!
//! A [`FrameController`] owns one [`LaneTrack`] per side. Each frame it runs
//! either the full sliding-window search or the cheaper margin search around
//! the previous fit, gates the fresh fits on curvature plausibility and
//! reports curvature radius and lane-center offset in meters.
//!
//! ```no_run
//! use lane_tracker::prelude::*;
//!
//! let mut controller = FrameController::new(TrackerConfig::default());
//! let grid = BinaryGrid::zeros(720, 1280);
//! let report = controller.process(&grid);
//! if let Some(offset) = report.offset {
//!     println!("vehicle is {}", offset);
//! }
//! ```

pub mod config;
pub mod debug;
pub mod error;
pub mod grid;
pub mod tracking;
pub mod types;

pub use crate::error::LaneError;
pub use crate::grid::BinaryGrid;
pub use crate::tracking::{
    CurveModel, FrameController, FrameReport, LaneReading, LaneTrack, TrackerConfig,
};
pub use crate::types::{Config, LaneSide};

pub mod prelude {
    pub use crate::grid::BinaryGrid;
    pub use crate::tracking::{
        FrameController, FrameReport, LaneOffset, LaneReading, TrackerConfig,
    };
}
