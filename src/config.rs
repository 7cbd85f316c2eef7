//! Tunable constants of the designer, loadable from a JSON file.

use crate::error::{Error, Result};
use egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Designer settings. Every field has a default, so a config file only needs the
/// keys it wants to override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    /// Maximum distance (exclusive) at which a dragged edge aligns to a neighbour.
    pub snap_threshold: f32,
    pub grid_size: f32,
    /// Distance within which a final edge counts as aligned for guide lines.
    pub guide_tolerance: f32,
    pub history_limit: usize,
    pub min_widget_size: Vec2,
    pub min_form_size: Vec2,
    /// Height of the simulated window title bar drawn above the content area.
    pub title_bar_height: f32,
    pub cascade_origin: f32,
    /// Space left between a cascaded widget and the widget it is stacked against.
    pub cascade_gap: f32,
    /// Diagonal step used once the form has no free cascade slot.
    pub cascade_step: f32,
    pub duplicate_offset: f32,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            snap_threshold: 6.0,
            grid_size: 4.0,
            guide_tolerance: 1.0,
            history_limit: 100,
            min_widget_size: vec2(40.0, 20.0),
            min_form_size: vec2(200.0, 150.0),
            title_bar_height: 30.0,
            cascade_origin: 16.0,
            cascade_gap: 8.0,
            cascade_step: 24.0,
            duplicate_offset: 20.0,
        }
    }
}

impl DesignerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text).map_err(|e| Error::json(path, e))
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        Ok(cfg.sanitized())
    }

    // A zero grid or history limit would make snapping divide by zero or the
    // history unable to hold its baseline.
    pub(crate) fn sanitized(mut self) -> Self {
        if self.grid_size.is_nan() || self.grid_size <= 0.0 {
            self.grid_size = 1.0;
        }
        self.history_limit = self.history_limit.max(1);
        self.snap_threshold = self.snap_threshold.max(0.0);
        self.guide_tolerance = self.guide_tolerance.max(0.0);
        self.cascade_gap = self.cascade_gap.max(0.0);
        self
    }
}
