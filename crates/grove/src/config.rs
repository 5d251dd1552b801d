//! Engine configuration.
//!
//! Every tunable constant lives here. Defaults reproduce the values the scroll
//! engine was tuned with; hosts may override them from JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunable engine constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distance, in logical units, within which an offset counts as having
    /// reached a boundary or a programmatic target.
    pub boundary_epsilon: f32,
    /// Minimum movement on either axis before a throttled scroll
    /// notification fires.
    pub min_offset_delta: f32,
    /// Scroll notification throttle used when props do not set one.
    pub default_scroll_throttle_ms: u64,
    /// Detach children outside the scroll window for containers that ask
    /// for it.
    pub clipped_subviews: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            boundary_epsilon: 0.001,
            min_offset_delta: 0.01,
            default_scroll_throttle_ms: 0,
            clipped_subviews: true,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// The default throttle as a duration.
    pub fn default_scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.default_scroll_throttle_ms)
    }
}
