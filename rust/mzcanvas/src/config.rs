use serde::{
    Deserialize,
    Serialize,
};
use std::io::Read;

use crate::errors::CanvasError;
use crate::models::ScanRange;
use crate::render::color::DEFAULT_COLOR_CYCLE;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 10.0,
            right: 30.0,
            bottom: 50.0,
            left: 90.0,
        }
    }
}

/// Durations of the interaction timers, in milliseconds.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct InteractionTimings {
    pub redraw_debounce_ms: f64,
    pub brush_throttle_ms: f64,
    pub spectrum_idle_ms: f64,
    pub feature_map_idle_ms: f64,
    pub transition_ms: f64,
}

impl Default for InteractionTimings {
    fn default() -> Self {
        Self {
            redraw_debounce_ms: 5.0,
            brush_throttle_ms: 200.0,
            spectrum_idle_ms: 350.0,
            feature_map_idle_ms: 5000.0,
            transition_ms: 100.0,
        }
    }
}

/// Distances within which hovering the pointer produces an annotation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct HoverTolerances {
    /// Absolute m/z distance for centroid peak labels.
    pub peak_mz: f64,
    /// Absolute m/z distance for isotopic envelope overlays.
    pub envelope_mz: f64,
    /// Absolute time distance on feature profiles.
    pub profile_time: f64,
    /// Deconvolved feature overlays are drawn within this m/z distance ...
    pub feature_draw_mz: f64,
    /// ... and cleared beyond this one.
    pub feature_clear_mz: f64,
    /// Maximum number of simultaneously labeled profile traces.
    pub max_profile_labels: usize,
}

impl Default for HoverTolerances {
    fn default() -> Self {
        Self {
            peak_mz: 0.3,
            envelope_mz: 1.5,
            profile_time: 0.01,
            feature_draw_mz: 10.0,
            feature_clear_mz: 15.0,
            max_profile_labels: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub profile_height: f64,
    pub margins: Margins,
    pub palette: Vec<String>,
    /// Used by m/z canvases when the data carries no scan window.
    pub default_scan_range: Option<ScanRange>,
    pub timings: InteractionTimings,
    pub hover: HoverTolerances,
    /// Upper bound of traces shown in a linked profile view.
    pub max_profile_features: usize,
    pub subsample_threshold: usize,
    pub subsample_resolution: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        let margins = Margins::default();
        Self {
            width: 1200.0 - margins.left - margins.right,
            height: 500.0 - margins.top - margins.bottom,
            profile_height: 250.0,
            margins,
            palette: DEFAULT_COLOR_CYCLE.iter().map(|c| c.to_string()).collect(),
            default_scan_range: Some(ScanRange::new(80.0, 2000.0)),
            timings: InteractionTimings::default(),
            hover: HoverTolerances::default(),
            max_profile_features: 1000,
            subsample_threshold: 50_000,
            subsample_resolution: 0.001,
        }
    }
}

impl CanvasConfig {
    /// Reads a JSON config, missing fields take their defaults.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CanvasError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        // Test: Only overriding the palette leaves the timers untouched
        let json = r#"{"palette": ["red", "blue"], "timings": {"brush_throttle_ms": 50}}"#;
        let config = CanvasConfig::from_reader(json.as_bytes()).unwrap();
        assert_eq!(config.palette, vec!["red".to_string(), "blue".to_string()]);
        assert_eq!(config.timings.brush_throttle_ms, 50.0);
        assert_eq!(config.timings.spectrum_idle_ms, 350.0);
        assert_eq!(config.max_profile_features, 1000);
    }

    #[test]
    fn test_default_dimensions() {
        let config = CanvasConfig::default();
        assert_eq!(config.width, 1080.0);
        assert_eq!(config.height, 440.0);
        assert_eq!(config.palette.len(), 8);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let result = CanvasConfig::from_reader("{\"width\": \"wide\"}".as_bytes());
        assert!(matches!(result, Err(CanvasError::Config(_))));
    }
}
