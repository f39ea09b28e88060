//! List audio input devices the installation can listen to.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::audio::capture::usable_input_devices;
use crate::audio::suppress_alsa_warnings;

/// Prints every usable input device with its index and default config.
///
/// The index or the name can be used as `audio.device` in the config file.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let (default_name, devices) = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let devices = usable_input_devices(&host)?;
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        Ok((default_name, devices))
    })?;

    if devices.is_empty() {
        println!("No audio input devices found. Use `depthwave run --no-audio` instead.");
        return Ok(());
    }

    println!("Audio input devices:");
    println!();

    for (index, device) in devices.iter().enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let marker = if default_name.as_deref() == Some(name.as_str()) {
            " [DEFAULT]"
        } else {
            ""
        };

        let details = match device.default_input_config() {
            Ok(config) => format!(
                "{}Hz, {} channels, {:?}",
                config.sample_rate().0,
                config.channels(),
                config.sample_format()
            ),
            Err(_) => "configuration unavailable".to_string(),
        };

        println!("  {index:>2}  {name}{marker}");
        println!("      {details}");
    }

    println!();
    println!("Set `device` under [audio] in the config file to an index or a name.");
    Ok(())
}
