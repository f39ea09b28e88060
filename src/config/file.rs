//! Configuration file management for depthwave.
//!
//! This module handles loading and saving the installation configuration from
//! a TOML file in the user's config directory. Every field has a default, so a
//! partial file is valid.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Audio input and analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `depthwave list-devices`
    /// - device name from `depthwave list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested capture sample rate in Hz (the device rate wins if different)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Reference level in dBFS shown as the top of the spectrum
    #[serde(default = "default_reference_level_db")]
    pub reference_level_db: i8,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_reference_level_db() -> i8 {
    -20
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            reference_level_db: default_reference_level_db(),
        }
    }
}

/// Spectrogram ribbon layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Slices kept per ribbon
    #[serde(default = "default_time_slices")]
    pub time_slices: usize,
    /// Frequency bins per slice
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Depth between consecutive slices
    #[serde(default = "default_distance_between_lines")]
    pub distance_between_lines: f32,
    /// Horizontal widening per slice of age
    #[serde(default = "default_line_spread")]
    pub line_spread: f32,
    /// Target frames per second
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_time_slices() -> usize {
    40
}

fn default_bins() -> usize {
    128
}

fn default_distance_between_lines() -> f32 {
    0.06
}

fn default_line_spread() -> f32 {
    0.015
}

fn default_fps() -> u32 {
    60
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_slices: default_time_slices(),
            bins: default_bins(),
            distance_between_lines: default_distance_between_lines(),
            line_spread: default_line_spread(),
            fps: default_fps(),
        }
    }
}

/// Depth sensor and trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorConfig {
    /// Columns of the depth image (and of the gain contour)
    #[serde(default = "default_sensor_width")]
    pub width: usize,
    /// Rows of the depth image
    #[serde(default = "default_sensor_height")]
    pub height: usize,
    /// Readings nearer than this raise the contour, in millimetres
    #[serde(default = "default_distance_threshold_mm")]
    pub distance_threshold_mm: f32,
    /// Summed gain above which a body counts as present
    #[serde(default = "default_enter_threshold")]
    pub enter_threshold: f32,
    /// Pixel stride of the drawn point cloud, in both directions
    #[serde(default = "default_point_step")]
    pub point_step: usize,
}

fn default_sensor_width() -> usize {
    640
}

fn default_sensor_height() -> usize {
    480
}

fn default_distance_threshold_mm() -> f32 {
    1500.0
}

fn default_enter_threshold() -> f32 {
    6.0
}

fn default_point_step() -> usize {
    8
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            width: default_sensor_width(),
            height: default_sensor_height(),
            distance_threshold_mm: default_distance_threshold_mm(),
            enter_threshold: default_enter_threshold(),
            point_step: default_point_step(),
        }
    }
}

/// Camera sway between two poses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    /// Animation progress per frame, in seconds of a one second sway
    #[serde(default = "default_camera_speed")]
    pub speed: f32,
    /// Vertical field of view in degrees
    #[serde(default = "default_fov_deg")]
    pub fov_deg: f32,
    #[serde(default = "default_eye_from")]
    pub eye_from: [f32; 3],
    #[serde(default = "default_eye_to")]
    pub eye_to: [f32; 3],
    #[serde(default = "default_look_at_from")]
    pub look_at_from: [f32; 3],
    #[serde(default = "default_look_at_to")]
    pub look_at_to: [f32; 3],
}

fn default_camera_speed() -> f32 {
    0.003
}

fn default_fov_deg() -> f32 {
    60.0
}

fn default_eye_from() -> [f32; 3] {
    [-3.0, 0.1, -0.7]
}

fn default_eye_to() -> [f32; 3] {
    [2.14, -0.1, -1.63]
}

fn default_look_at_from() -> [f32; 3] {
    [-0.2, 0.0, 2.35]
}

fn default_look_at_to() -> [f32; 3] {
    [-0.6, 0.0, 3.2]
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed: default_camera_speed(),
            fov_deg: default_fov_deg(),
            eye_from: default_eye_from(),
            eye_to: default_eye_to(),
            look_at_from: default_look_at_from(),
            look_at_to: default_look_at_to(),
        }
    }
}

/// Complete installation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DepthwaveConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

impl DepthwaveConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed or fails validation
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        Self::parse(&config_content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    /// - If the TOML is malformed
    /// - If a ribbon dimension or the frame rate is zero
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: DepthwaveConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.display.time_slices == 0 || self.display.bins == 0 {
            return Err(anyhow!(
                "display.time_slices and display.bins must be greater than zero"
            ));
        }
        if self.display.fps == 0 {
            return Err(anyhow!("display.fps must be greater than zero"));
        }
        if self.sensor.width == 0 || self.sensor.height == 0 {
            return Err(anyhow!("sensor.width and sensor.height must be greater than zero"));
        }
        if self.sensor.point_step == 0 {
            return Err(anyhow!("sensor.point_step must be greater than zero"));
        }
        Ok(())
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file, creating its directory.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not find home directory"))?
        .join(".config")
        .join("depthwave");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("depthwave.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = DepthwaveConfig::parse("").unwrap();
        assert_eq!(config, DepthwaveConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = DepthwaveConfig::parse(
            r#"
            [display]
            bins = 64

            [sensor]
            distance_threshold_mm = 900.0
            "#,
        )
        .unwrap();
        assert_eq!(config.display.bins, 64);
        assert_eq!(config.display.time_slices, default_time_slices());
        assert_eq!(config.sensor.distance_threshold_mm, 900.0);
        assert_eq!(config.audio.device, "default");
    }

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&DepthwaveConfig::default()).unwrap();
        assert_eq!(DepthwaveConfig::parse(&text).unwrap(), DepthwaveConfig::default());
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        assert!(DepthwaveConfig::parse("[display]\nbins = 0").is_err());
        assert!(DepthwaveConfig::parse("[display]\nfps = 0").is_err());
        assert!(DepthwaveConfig::parse("[sensor]\nwidth = 0").is_err());
        assert!(DepthwaveConfig::parse("[sensor]\npoint_step = 0").is_err());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(DepthwaveConfig::parse("[display\nbins = 4").is_err());
    }
}
