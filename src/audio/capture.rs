//! Live microphone capture for spectrum analysis.
//!
//! Audio is captured from the configured input device, converted to mono f32
//! in the callback, and kept in a bounded window of the most recent samples.
//! Nothing is written to disk.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::{Arc, Mutex};

use super::suppress_alsa_warnings;

/// Source of recent mono samples for the analysis engine.
pub trait SampleFeed {
    /// The most recent samples, oldest first.
    fn latest(&self) -> Vec<f32>;

    /// Sample rate of the feed in Hz.
    fn sample_rate(&self) -> u32;

    /// Called once per rendered frame before `latest`.
    fn advance_frame(&mut self) {}
}

/// Captures audio from a specified or default input device.
///
/// Features:
/// - Captures at the device's native sample rate and sample format
/// - Converts multi-channel audio to mono by averaging channels
/// - Keeps only the last `window` samples
pub struct AudioCapture {
    /// Actual capture sample rate from device
    sample_rate: u32,
    /// Most recent mono samples
    samples: Arc<Mutex<Vec<f32>>>,
    /// Active audio input stream (kept alive while capturing)
    stream: Option<cpal::Stream>,
    /// Number of samples retained
    window: usize,
    /// Device name or "default" to use the system default device
    device_name: String,
}

impl AudioCapture {
    /// Creates a capture for the requested device.
    ///
    /// The actual sample rate may differ; it is known after `start()`.
    pub fn new(requested_sample_rate: u32, device_name: String, window: usize) -> Self {
        Self {
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::with_capacity(window * 2))),
            stream: None,
            window,
            device_name,
        }
    }

    /// Starts capturing from the configured input device.
    ///
    /// # Errors
    /// - If the specified device is not available
    /// - If the device sample format is unsupported
    /// - If audio stream creation fails
    pub fn start(&mut self) -> Result<()> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Capturing at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            device_sample_rate,
            num_channels,
            device_config.sample_format()
        );

        self.sample_rate = device_sample_rate;

        let sample_format = device_config.sample_format();
        let stream_config: cpal::StreamConfig = device_config.into();
        let stream = match sample_format {
            cpal::SampleFormat::F32 => {
                self.build_stream::<f32>(&device, &stream_config, num_channels)?
            }
            cpal::SampleFormat::I16 => {
                self.build_stream::<i16>(&device, &stream_config, num_channels)?
            }
            cpal::SampleFormat::U16 => {
                self.build_stream::<u16>(&device, &stream_config, num_channels)?
            }
            cpal::SampleFormat::I32 => {
                self.build_stream::<i32>(&device, &stream_config, num_channels)?
            }
            other => return Err(anyhow!("Unsupported sample format: {other:?}")),
        };

        stream.play()?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        num_channels: usize,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let samples_arc = Arc::clone(&self.samples);
        let window = self.window;

        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                Self::handle_audio_callback(data, &samples_arc, num_channels, window);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }

    /// Handles incoming audio data from the audio callback.
    ///
    /// Averages all channels into mono and trims the shared buffer back to
    /// the analysis window.
    fn handle_audio_callback<T>(
        data: &[T],
        samples_arc: &Arc<Mutex<Vec<f32>>>,
        num_channels: usize,
        window: usize,
    ) where
        T: Sample,
        f32: FromSample<T>,
    {
        let mut samples = samples_arc.lock().unwrap();
        append_mono(&mut samples, data, num_channels);

        if samples.len() > window {
            let excess = samples.len() - window;
            samples.drain(..excess);
        }
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Audio stream stopped");
        }
    }
}

impl SampleFeed for AudioCapture {
    fn latest(&self) -> Vec<f32> {
        self.samples.lock().unwrap().clone()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Appends interleaved `data` to `samples` as mono f32.
fn append_mono<T>(samples: &mut Vec<f32>, data: &[T], num_channels: usize)
where
    T: Sample,
    f32: FromSample<T>,
{
    match num_channels {
        0 => {}
        1 => samples.extend(data.iter().map(|&s| s.to_sample::<f32>())),
        _ => {
            for chunk in data.chunks_exact(num_channels) {
                let sum: f32 = chunk.iter().map(|&s| s.to_sample::<f32>()).sum();
                samples.push(sum / num_channels as f32);
            }
        }
    }
}

/// Input devices that can report a name, in host order.
///
/// `list-devices` numbers exactly this list, so an index printed there
/// selects the same device here.
///
/// # Errors
/// - If the host cannot enumerate input devices
pub fn usable_input_devices(host: &cpal::Host) -> Result<Vec<cpal::Device>> {
    Ok(host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
        .filter(|d| d.name().is_ok())
        .collect())
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    select_device(usable_input_devices(host)?, device_spec, |d| d.name().ok())
}

fn select_device<D>(
    mut devices: Vec<D>,
    device_spec: &str,
    name_of: impl Fn(&D) -> Option<String>,
) -> Result<D> {
    if let Ok(index) = device_spec.parse::<usize>() {
        let count = devices.len();
        if index < count {
            return Ok(devices.swap_remove(index));
        }
        return Err(anyhow!(
            "Device index {} is out of range (0-{})",
            index,
            count.saturating_sub(1)
        ));
    }

    devices
        .into_iter()
        .find(|d| name_of(d).as_deref() == Some(device_spec))
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. \
                 Use 'depthwave list-devices' to see available devices."
            )
        })
}
