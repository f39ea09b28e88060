//! Terminal screens.

pub mod error;
pub mod tui;

pub use error::report;
pub use tui::{InstallationCommand, InstallationTui};
