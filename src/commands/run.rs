//! The installation loop.
//!
//! Loads the configuration, connects the engine and the depth source, and
//! drives update and render once per frame until asked to stop. SIGTERM
//! stops the loop; SIGUSR1 fires the test tone, so the piece can be checked
//! from outside the terminal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::{AudioCapture, FFT_SIZE};
use crate::config::DepthwaveConfig;
use crate::installation::{Control, Installation};
use crate::sonify::{AnalysisEngine, SimulatedDepth, SynthEngine, SyntheticFeed};
use crate::ui::{self, InstallationCommand, InstallationTui};

/// Seconds between status lines in the log.
const STATUS_LOG_SECONDS: u64 = 5;

/// Runs the installation.
///
/// `no_audio` replaces the microphone with a synthetic chord. `fps`
/// overrides the configured frame rate.
///
/// # Errors
/// - If the configuration is invalid
/// - If the audio device cannot be opened
/// - If the terminal cannot be driven
pub async fn handle_run(no_audio: bool, fps: Option<u32>) -> Result<(), anyhow::Error> {
    tracing::info!("=== depthwave started ===");

    let mut config = match DepthwaveConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            ui::report(
                "Configuration error",
                &format!("{err:#}\n\nRun `depthwave config` to fix the file."),
            )?;
            return Err(err.context("Configuration error"));
        }
    };
    if let Some(fps) = fps.filter(|&fps| fps > 0) {
        config.display.fps = fps;
    }

    tracing::info!(
        "Configuration loaded: device={}, {} slices x {} bins, {} fps, threshold {} mm",
        config.audio.device,
        config.display.time_slices,
        config.display.bins,
        config.display.fps,
        config.sensor.distance_threshold_mm
    );

    let engine = match build_engine(&config, no_audio) {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!("Failed to start audio: {err:#}");
            ui::report(
                "Audio error",
                &format!("{err:#}\n\nCheck `depthwave list-devices`, or run with --no-audio."),
            )?;
            return Err(err);
        }
    };

    let source = Box::new(SimulatedDepth::new(config.sensor.width, config.sensor.height));
    let mut installation = Installation::new(&config, engine, source)?;

    let quit = Arc::new(AtomicBool::new(false));
    let tone = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, quit.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, tone.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = InstallationTui::new()?;
    let result = frame_loop(&mut tui, &mut installation, config.display.fps, &quit, &tone).await;
    tui.cleanup()?;

    if let Err(err) = &result {
        tracing::error!("Installation stopped: {err:#}");
        ui::report("Installation stopped", &format!("{err:#}"))?;
    }

    tracing::info!("=== depthwave exited ===");
    result
}

fn build_engine(config: &DepthwaveConfig, no_audio: bool) -> anyhow::Result<Box<dyn SynthEngine>> {
    let bins = config.display.bins;
    let reference = config.audio.reference_level_db;

    if no_audio {
        tracing::info!("Running without audio input");
        let feed = SyntheticFeed::new(config.audio.sample_rate, FFT_SIZE, config.display.fps);
        return Ok(Box::new(AnalysisEngine::new(feed, bins, reference)));
    }

    let mut capture = AudioCapture::new(
        config.audio.sample_rate,
        config.audio.device.clone(),
        FFT_SIZE,
    );
    capture.start()?;
    Ok(Box::new(AnalysisEngine::new(capture, bins, reference)))
}

async fn frame_loop(
    tui: &mut InstallationTui,
    installation: &mut Installation,
    fps: u32,
    quit: &AtomicBool,
    tone: &AtomicBool,
) -> anyhow::Result<()> {
    let frame_budget = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
    let status_every = u64::from(fps.max(1)) * STATUS_LOG_SECONDS;
    let mut frame_count = 0u64;

    tracing::debug!("Entering frame loop at {} fps", fps);

    loop {
        let frame_start = Instant::now();

        if quit.load(Ordering::Relaxed) {
            tracing::info!("Received SIGTERM, stopping");
            break;
        }
        if tone.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1, firing test tone");
            installation.apply(Control::TestTone);
        }

        match tui.handle_input(Duration::ZERO)? {
            InstallationCommand::Quit => break,
            InstallationCommand::Control(control) => installation.apply(control),
            InstallationCommand::Continue => {}
        }

        installation.update()?;
        tui.render(installation)?;

        frame_count += 1;
        if frame_count.is_multiple_of(status_every) {
            let status = installation.status();
            tracing::debug!(
                "Frame {}: trigger={}, gain sum={:.2}, avg={:.3}, threshold={} mm",
                frame_count,
                status.trigger,
                status.gains.sum,
                status.gains.average,
                status.distance_threshold_mm
            );
        }

        let remaining = frame_budget.saturating_sub(frame_start.elapsed());
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
    }

    tracing::info!("Frame loop finished after {} frames", frame_count);
    Ok(())
}
