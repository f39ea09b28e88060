//! Configuration management for depthwave.
//!
//! Configuration is a single TOML file in the user's config directory. It is
//! written with defaults on first run and read once at startup.

pub mod file;

pub use file::{get_config_path, CameraConfig, DepthwaveConfig};
