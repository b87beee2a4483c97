//! Editor session configuration.
//!
//! Plain data with sensible defaults; every field may be omitted when the
//! host supplies it as JSON.

use serde::{Deserialize, Serialize};

/// Zoom limits and wheel sensitivity for the canvas viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale change per unit of wheel delta.
    pub intensity: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.3,
            max_scale: 4.0,
            intensity: 0.0015,
        }
    }
}

/// Lowest scale any configuration can reach; content mapping divides by it.
pub const SCALE_FLOOR: f64 = 0.01;

impl ZoomConfig {
    /// Limit `scale` to the configured range, never below `SCALE_FLOOR`.
    /// A backwards range (`min_scale > max_scale`) pins to `min_scale`.
    pub fn clamp(&self, scale: f64) -> f64 {
        scale
            .min(self.max_scale)
            .max(self.min_scale)
            .max(SCALE_FLOOR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum undo depth. `0` keeps every step.
    pub history_depth: usize,
    pub zoom: ZoomConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 200,
            zoom: ZoomConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"historyDepth": 10}"#).unwrap();
        assert_eq!(config.history_depth, 10);
        assert_eq!(config.zoom, ZoomConfig::default());

        let config: EditorConfig =
            serde_json::from_str(r#"{"zoom": {"maxScale": 8.0}}"#).unwrap();
        assert_eq!(config.zoom.max_scale, 8.0);
        assert_eq!(config.zoom.min_scale, 0.3);
    }

    #[test]
    fn hostile_bounds_keep_scale_positive() {
        let zoom: ZoomConfig =
            serde_json::from_str(r#"{"minScale": 0, "maxScale": -2}"#).unwrap();
        for scale in [-5.0, 0.0, 1.0, 100.0, f64::NAN] {
            assert!(zoom.clamp(scale) >= SCALE_FLOOR, "scale {scale}");
        }
        assert_eq!(ZoomConfig::default().clamp(0.0), 0.3);
        assert_eq!(ZoomConfig::default().clamp(9.0), 4.0);
    }
}
