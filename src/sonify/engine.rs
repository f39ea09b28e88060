//! Boundary to the synthesis engine.
//!
//! The installation exchanges named arrays with the engine once per frame:
//! it writes the gain curve and reads back a "past" and a "future" spectrum.
//! The DSP behind those arrays lives outside this crate; [`AnalysisEngine`]
//! stands in for it by analysing live input.

use crate::audio::{SampleFeed, SpectrumAnalyzer};
use crate::spectrogram::resample;

/// Array exchange with a running synthesis engine.
pub trait SynthEngine {
    /// Publishes the per-bin gain curve.
    fn write_gain(&mut self, gains: &[f32]);

    /// Fills `out` with the spectrum of what has been heard.
    fn read_past(&mut self, out: &mut [f32]);

    /// Fills `out` with the spectrum of what is about to be heard.
    fn read_future(&mut self, out: &mut [f32]);

    /// Sends a named trigger message.
    fn bang(&mut self, name: &str);
}

/// Frames a test tone stays mixed into the analysed signal.
const TEST_TONE_FRAMES: u32 = 45;
const TEST_TONE_HZ: f32 = 440.0;
const TEST_TONE_LEVEL: f32 = 0.3;

/// Engine stand-in driven by a sample feed.
///
/// `past` is the smoothed spectrum of the feed. `future` is that spectrum
/// shaped by the most recent gain curve.
pub struct AnalysisEngine<F: SampleFeed> {
    feed: F,
    analyzer: SpectrumAnalyzer,
    reference_level_db: i8,
    gains: Vec<f32>,
    past: Vec<f32>,
    tone_frames_left: u32,
}

impl<F: SampleFeed> AnalysisEngine<F> {
    pub fn new(feed: F, num_bins: usize, reference_level_db: i8) -> Self {
        Self {
            feed,
            analyzer: SpectrumAnalyzer::new(num_bins),
            reference_level_db,
            gains: vec![0.0; num_bins],
            past: vec![0.0; num_bins],
            tone_frames_left: 0,
        }
    }

    fn mix_test_tone(&mut self, samples: &mut [f32]) {
        if self.tone_frames_left == 0 {
            return;
        }
        self.tone_frames_left -= 1;

        let step =
            2.0 * std::f32::consts::PI * TEST_TONE_HZ / self.feed.sample_rate().max(1) as f32;
        for (n, sample) in samples.iter_mut().enumerate() {
            *sample += TEST_TONE_LEVEL * (step * n as f32).sin();
        }
    }
}

impl<F: SampleFeed> SynthEngine for AnalysisEngine<F> {
    fn write_gain(&mut self, gains: &[f32]) {
        resample(gains, &mut self.gains);
    }

    fn read_past(&mut self, out: &mut [f32]) {
        self.feed.advance_frame();
        let mut samples = self.feed.latest();
        self.mix_test_tone(&mut samples);

        self.analyzer
            .update(&samples, self.feed.sample_rate(), self.reference_level_db);
        self.past.copy_from_slice(self.analyzer.data());
        resample(&self.past, out);
    }

    fn read_future(&mut self, out: &mut [f32]) {
        let shaped: Vec<f32> = self
            .past
            .iter()
            .zip(&self.gains)
            .map(|(magnitude, gain)| magnitude * gain)
            .collect();
        resample(&shaped, out);
    }

    fn bang(&mut self, name: &str) {
        match name {
            "testTone" => {
                tracing::info!("Test tone triggered");
                self.tone_frames_left = TEST_TONE_FRAMES;
            }
            other => tracing::warn!("Ignoring unknown bang '{}'", other),
        }
    }
}

/// Sample feed that synthesises a slowly drifting chord, for running
/// without an input device.
pub struct SyntheticFeed {
    sample_rate: u32,
    window: usize,
    frames: u64,
    fps: u32,
}

impl SyntheticFeed {
    pub fn new(sample_rate: u32, window: usize, fps: u32) -> Self {
        Self {
            sample_rate,
            window,
            frames: 0,
            fps: fps.max(1),
        }
    }

    /// Seconds since the feed started, derived from the frame count.
    fn seconds(&self) -> f64 {
        self.frames as f64 / self.fps as f64
    }
}

/// Sine of `cycles` full turns, reduced to one period before narrowing.
fn sine_of_cycles(cycles: f64) -> f32 {
    (std::f64::consts::TAU * cycles.fract()).sin() as f32
}

impl SampleFeed for SyntheticFeed {
    fn latest(&self) -> Vec<f32> {
        let rate = self.sample_rate.max(1) as f64;
        let time = self.seconds();
        let drift = 1.0 + 0.25 * ((time * 0.4) % std::f64::consts::TAU).sin();
        let partials = [
            (110.0 * drift, 0.4),
            (330.0 * drift, 0.2),
            (1250.0, 0.1 * ((time * 2.0) % std::f64::consts::TAU).cos().abs() as f32),
        ];

        (0..self.window)
            .map(|n| {
                let t = time + n as f64 / rate;
                partials
                    .iter()
                    .map(|&(freq, level)| level * sine_of_cycles(freq * t))
                    .sum::<f32>()
            })
            .collect()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn advance_frame(&mut self) {
        self.frames = self.frames.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silence;

    impl SampleFeed for Silence {
        fn latest(&self) -> Vec<f32> {
            vec![0.0; crate::audio::FFT_SIZE]
        }

        fn sample_rate(&self) -> u32 {
            16000
        }
    }

    #[test]
    fn test_silence_reads_flat_spectra() {
        let mut engine = AnalysisEngine::new(Silence, 32, -20);
        engine.write_gain(&[1.0; 8]);
        let mut past = vec![1.0; 16];
        let mut future = vec![1.0; 16];
        engine.read_past(&mut past);
        engine.read_future(&mut future);
        assert_eq!(past, vec![0.0; 16]);
        assert_eq!(future, vec![0.0; 16]);
    }

    #[test]
    fn test_test_tone_shows_up_in_past() {
        let mut engine = AnalysisEngine::new(Silence, 32, -20);
        engine.bang("testTone");
        let mut past = vec![0.0; 32];
        engine.read_past(&mut past);
        assert!(past.iter().any(|&m| m > 0.0));
    }

    #[test]
    fn test_future_is_gated_by_gain() {
        let mut engine = AnalysisEngine::new(Silence, 8, -20);
        engine.bang("testTone");
        let mut past = vec![0.0; 8];
        engine.read_past(&mut past);

        engine.write_gain(&[0.0; 8]);
        let mut future = vec![1.0; 8];
        engine.read_future(&mut future);
        assert_eq!(future, vec![0.0; 8]);

        engine.write_gain(&[1.0; 8]);
        engine.read_future(&mut future);
        assert_eq!(future, past);
    }

    #[test]
    fn test_unknown_bang_is_ignored() {
        let mut engine = AnalysisEngine::new(Silence, 8, -20);
        engine.bang("nope");
        let mut past = vec![0.0; 8];
        engine.read_past(&mut past);
        assert_eq!(past, vec![0.0; 8]);
    }

    #[test]
    fn test_synthetic_feed_fills_window() {
        let mut feed = SyntheticFeed::new(16000, 512, 60);
        let before = feed.latest();
        feed.advance_frame();
        let after = feed.latest();
        assert_eq!(before.len(), 512);
        assert_ne!(before, after);
        assert!(after.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_synthetic_feed_stays_smooth_after_hours() {
        let mut feed = SyntheticFeed::new(16000, 2048, 60);
        // Four days at 60 fps
        feed.frames = 60 * 60 * 60 * 24 * 4;
        assert_eq!(feed.seconds(), 345_600.0);

        let samples = feed.latest();
        let repeated = samples.windows(2).filter(|pair| pair[0] == pair[1]).count();
        assert!(repeated < 20, "{repeated} adjacent samples are identical");

        feed.advance_frame();
        assert_ne!(feed.latest(), samples);
    }
}
