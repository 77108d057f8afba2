use crate::error::LaneError;
use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        let config: Config =
            serde_yaml::from_str(&contents).with_context(|| format!("parsing config {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), LaneError> {
        let camera = &self.camera;
        if !(camera.xm_per_pix > 0.0 && camera.ym_per_pix > 0.0) {
            return Err(LaneError::InvalidConfig(format!(
                "meter-per-pixel constants must be positive (x={}, y={})",
                camera.xm_per_pix, camera.ym_per_pix
            )));
        }
        if self.search.window_count == 0 {
            return Err(LaneError::InvalidConfig(
                "search.window_count must be at least 1".to_string(),
            ));
        }
        if self.search.margin == 0 || self.search.tracked_margin == 0 {
            return Err(LaneError::InvalidConfig(
                "search margins must be positive".to_string(),
            ));
        }
        if self.tracking.history_len == 0 {
            return Err(LaneError::InvalidConfig(
                "tracking.history_len must be at least 1".to_string(),
            ));
        }
        if self.tracking.failure_threshold == 0 {
            return Err(LaneError::InvalidConfig(
                "tracking.failure_threshold must be at least 1".to_string(),
            ));
        }
        if !(self.tracking.curvature_ceiling_m > 0.0) {
            return Err(LaneError::InvalidConfig(format!(
                "tracking.curvature_ceiling_m must be positive, got {}",
                self.tracking.curvature_ceiling_m
            )));
        }
        Ok(())
    }
}
