//! Open the configuration file in an editor.

use std::process::Command;

use crate::config::{get_config_path, DepthwaveConfig};

/// Opens the config file in `$EDITOR`, falling back to nano or vi, then
/// checks that the edited file still parses.
///
/// # Errors
/// - If no editor can be found or it exits with an error
/// - If the edited file is invalid
pub fn handle_config() -> anyhow::Result<()> {
    crate::setup::run_setup()?;
    let config_path = get_config_path()?;

    let editor = find_editor()?;
    tracing::info!("Opening {} with {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| anyhow::anyhow!("Failed to open editor '{editor}': {e}"))?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    DepthwaveConfig::load()?;
    tracing::info!("Config file edited successfully");
    Ok(())
}

fn find_editor() -> anyhow::Result<String> {
    if let Some(editor) = std::env::var("EDITOR").ok().filter(|e| !e.is_empty()) {
        return Ok(editor);
    }

    ["nano", "vi"]
        .into_iter()
        .find(|editor| is_editor_available(editor))
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow::anyhow!("No editor found. Please set the $EDITOR environment variable.")
        })
}

fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
