//! Viewer configuration, read from a JSON file.
//!
//! Every field has a default, so a config file only needs to list the values
//! it changes:
//!
//! ```json
//! { "scene": "cornell", "samples_per_pixel": 8, "target_fps": 20 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Built-in scene to load at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    /// Ground plane with a field of small random spheres.
    #[default]
    Spheres,
    /// Quad-walled box lit by a ceiling light.
    Cornell,
    /// Checker, noise and image textured spheres.
    Textured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// Trace resolution relative to the window (0.25 traces a quarter of
    /// the pixels along each axis).
    pub render_scale: f32,
    pub samples_per_pixel: u32,
    /// Full passes over every sample slot before the image counts as converged.
    pub max_passes: u32,
    pub target_fps: f32,
    pub max_depth: u32,
    pub seed: u64,
    pub scene: SceneKind,
    /// Image used by the textured scene.
    pub texture_path: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            render_scale: 0.5,
            samples_per_pixel: 4,
            max_passes: 10,
            target_fps: 30.0,
            max_depth: 10,
            seed: 0x5eed,
            scene: SceneKind::default(),
            texture_path: None,
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`ViewerConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".into()));
        }
        if !(self.render_scale > 0.0 && self.render_scale <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "render_scale must be in (0, 1], got {}",
                self.render_scale
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::Invalid("samples_per_pixel must be at least 1".into()));
        }
        if self.max_passes == 0 {
            return Err(ConfigError::Invalid("max_passes must be at least 1".into()));
        }
        if !(self.target_fps > 0.0) {
            return Err(ConfigError::Invalid("target_fps must be positive".into()));
        }

        // One accumulator slot per pixel and sample, addressed with u32.
        let (width, height) = self.render_size(self.window_width, self.window_height);
        let slots = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(self.samples_per_pixel as u64));
        if !slots.is_some_and(|slots| slots <= u32::MAX as u64) {
            return Err(ConfigError::Invalid(format!(
                "{}x{} at {} samples_per_pixel needs more than {} accumulator slots",
                width,
                height,
                self.samples_per_pixel,
                u32::MAX
            )));
        }
        Ok(())
    }

    /// Size of the traced image for a window of the given size.
    pub fn render_size(&self, window_width: u32, window_height: u32) -> (u32, u32) {
        let w = ((window_width as f32) * self.render_scale).round() as u32;
        let h = ((window_height as f32) * self.render_scale).round() as u32;
        (w.max(1), h.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ViewerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{ "scene": "cornell", "samples_per_pixel": 8 }"#).unwrap();
        assert_eq!(config.scene, SceneKind::Cornell);
        assert_eq!(config.samples_per_pixel, 8);
        assert_eq!(config.max_passes, ViewerConfig::default().max_passes);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = ViewerConfig {
            samples_per_pixel: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ViewerConfig {
            render_scale: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_slot_count_must_fit_u32() {
        let config = ViewerConfig {
            render_scale: 1.0,
            samples_per_pixel: 5000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ViewerConfig {
            render_scale: 1.0,
            samples_per_pixel: 4000,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = serde_json::from_str::<ViewerConfig>("{ not json").unwrap_err();
        assert!(matches!(ConfigError::from(err), ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ViewerConfig::load_or_default("does/not/exist.json").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_render_size() {
        let config = ViewerConfig::default();
        assert_eq!(config.render_size(1280, 720), (640, 360));
        assert_eq!(config.render_size(1, 1), (1, 1));
    }
}
