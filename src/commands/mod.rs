//! Command handlers for depthwave.
//!
//! # Commands
//! - `run`: The installation itself (default)
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries
//! - `config`: Open the configuration file in the user's editor

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod run;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use run::handle_run;
