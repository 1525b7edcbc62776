//! Demo configuration
//!
//! Stored as RON, like the rest of the project's human-editable files.
//! Every field has a default, so a config file only needs the values it
//! changes and a missing file means "all defaults".

use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{Result, SoftpipeError};
use crate::rasterizer::Rgba;

/// Largest accepted window_scale
pub const MAX_WINDOW_SCALE: u32 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Internal render resolution in pixels
    pub width: usize,
    pub height: usize,
    /// Window size as a multiple of the render resolution
    pub window_scale: u32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Camera-space distances; triangles with any vertex outside are dropped
    pub near_clip: f32,
    pub far_clip: f32,
    /// Distance from the camera to the model center
    pub camera_distance: f32,
    /// Model spin in radians per second
    pub spin_speed: f32,
    /// Camera look in radians per pixel of mouse drag
    pub mouse_sensitivity: f32,
    /// Camera movement in world units per second
    pub move_speed: f32,
    /// Window background shown through uncovered pixels
    pub clear_color: Rgba,
    /// Alpha of the translucent panels in the demo mesh
    pub glass_alpha: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            window_scale: 3,
            fov_degrees: 60.0,
            near_clip: 0.5,
            far_clip: 200.0,
            camera_distance: 6.0,
            spin_speed: 0.8,
            mouse_sensitivity: 0.005,
            move_speed: 3.0,
            clear_color: Rgba::from_rgba8(30, 30, 40, 255),
            glass_alpha: 0.45,
        }
    }
}

impl DemoConfig {
    /// Reject values the renderer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SoftpipeError::config("resolution must be non-zero"));
        }
        if self.width > u16::MAX as usize || self.height > u16::MAX as usize {
            return Err(SoftpipeError::config("resolution does not fit a texture"));
        }
        if !(1..=MAX_WINDOW_SCALE).contains(&self.window_scale) {
            return Err(SoftpipeError::config(format!(
                "window_scale must be within 1..={MAX_WINDOW_SCALE}"
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(SoftpipeError::config("fov_degrees must be between 0 and 180"));
        }
        if !(self.near_clip > 0.0 && self.near_clip < self.far_clip) {
            return Err(SoftpipeError::config("need 0 < near_clip < far_clip"));
        }
        if !(self.mouse_sensitivity.is_finite() && self.mouse_sensitivity >= 0.0) {
            return Err(SoftpipeError::config("mouse_sensitivity must be a non-negative number"));
        }
        if !(self.move_speed.is_finite() && self.move_speed >= 0.0) {
            return Err(SoftpipeError::config("move_speed must be a non-negative number"));
        }
        if !(0.0..=1.0).contains(&self.glass_alpha) {
            return Err(SoftpipeError::config("glass_alpha must be within 0..=1"));
        }
        Ok(())
    }
}

/// Load a config from a RON file, falling back to defaults if it does not exist
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DemoConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        return Ok(DemoConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Parse and validate a config from a RON string
pub fn load_config_from_str(s: &str) -> Result<DemoConfig> {
    let config: DemoConfig = ron::from_str(s)?;
    config.validate()?;
    Ok(config)
}

/// Save a config to a RON file
pub fn save_config<P: AsRef<Path>>(config: &DemoConfig, path: P) -> Result<()> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(2)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(DemoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = load_config_from_str("(width: 640, height: 480)").unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.fov_degrees, DemoConfig::default().fov_degrees);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = load_config_from_str("(near_clip: 10.0, far_clip: 5.0)").unwrap_err();
        assert!(matches!(err, SoftpipeError::Config(_)));

        let err = load_config_from_str("(width: 0)").unwrap_err();
        assert!(matches!(err, SoftpipeError::Config(_)));
    }

    #[test]
    fn test_window_scale_bounded() {
        let err = load_config_from_str("(window_scale: 4000000000)").unwrap_err();
        assert!(matches!(err, SoftpipeError::Config(_)));

        let ok = load_config_from_str("(window_scale: 16)").unwrap();
        assert_eq!(ok.window_scale, MAX_WINDOW_SCALE);
    }

    #[test]
    fn test_negative_speeds_rejected() {
        let err = load_config_from_str("(mouse_sensitivity: -0.1)").unwrap_err();
        assert!(matches!(err, SoftpipeError::Config(_)));

        let err = load_config_from_str("(move_speed: -1.0)").unwrap_err();
        assert!(matches!(err, SoftpipeError::Config(_)));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = load_config_from_str("(width: \"wide\")").unwrap_err();
        assert!(matches!(err, SoftpipeError::Parse(_)));
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("softpipe-config-{}.ron", std::process::id()));
        let config = DemoConfig {
            spin_speed: 0.0,
            clear_color: Rgba::BLACK,
            ..DemoConfig::default()
        };
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = load_config("/nonexistent/softpipe.ron").unwrap();
        assert_eq!(config, DemoConfig::default());
    }
}
