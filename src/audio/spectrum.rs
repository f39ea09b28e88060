//! Frequency spectrum analysis using FFT.
//!
//! Produces one normalised magnitude per display bin, the slice format the
//! spectrogram ribbons consume.

use rustfft::{num_complex::Complex, FftPlanner};

/// FFT length; also the analysis window callers should capture.
pub const FFT_SIZE: usize = 2048;

const MIN_FREQ: f32 = 40.0;
const MAX_FREQ: f32 = 8000.0;

/// Dynamic range shown below the reference level.
const GATE_RANGE_DB: f32 = 60.0;

/// Stateful spectrum analyzer with internal FFT planner.
pub struct SpectrumAnalyzer {
    fft_planner: FftPlanner<f32>,
    display_data: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(num_bins: usize) -> Self {
        Self {
            fft_planner: FftPlanner::new(),
            display_data: vec![0.0; num_bins],
        }
    }

    /// Updates spectrum with new samples, applying smoothing.
    pub fn update(&mut self, samples: &[f32], sample_rate: u32, reference_level_db: i8) {
        let new_bins = calculate_spectrum(
            samples,
            sample_rate,
            self.display_data.len(),
            reference_level_db,
            &mut self.fft_planner,
        );

        // Moving average keeps the ribbon from flickering
        for (old_val, new_val) in self.display_data.iter_mut().zip(new_bins.iter()) {
            *old_val = (*old_val + *new_val) * 0.5;
        }
    }

    /// Returns the current display data, each bin in `[0, 1]`.
    pub fn data(&self) -> &[f32] {
        &self.display_data
    }
}

/// Calculates a frequency spectrum from mono samples.
///
/// Returns magnitudes normalised to `[0, 1]` across `num_bins` display bins
/// spread evenly over 40 Hz to 8 kHz (or Nyquist, whichever is lower).
///
/// # Arguments
/// * `samples` - Mono samples in `[-1, 1]`; only the last `FFT_SIZE` are used
/// * `sample_rate` - Sample rate in Hz
/// * `num_bins` - Number of display bins to return
/// * `reference_level_db` - dBFS level shown as full scale
/// * `fft_planner` - Reusable FFT planner
pub fn calculate_spectrum(
    samples: &[f32],
    sample_rate: u32,
    num_bins: usize,
    reference_level_db: i8,
    fft_planner: &mut FftPlanner<f32>,
) -> Vec<f32> {
    let mut result = vec![0.0; num_bins];
    if samples.is_empty() || num_bins == 0 || sample_rate == 0 {
        return result;
    }

    let sample_count = samples.len().min(FFT_SIZE);
    let recent_samples = &samples[samples.len() - sample_count..];

    // Hann window against spectral leakage
    let mut buffer: Vec<Complex<f32>> = recent_samples
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let window = 0.5
                * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / sample_count as f32).cos());
            Complex::new(s * window, 0.0)
        })
        .collect();

    buffer.resize(FFT_SIZE, Complex::new(0.0, 0.0));

    let fft = fft_planner.plan_fft_forward(FFT_SIZE);
    fft.process(&mut buffer);

    let freq_resolution = sample_rate as f32 / FFT_SIZE as f32;
    let nyquist_bin = FFT_SIZE / 2;

    let min_bin = ((MIN_FREQ / freq_resolution) as usize).max(1);
    let max_bin = ((MAX_FREQ / freq_resolution) as usize).min(nyquist_bin);
    if max_bin <= min_bin {
        return result;
    }

    let useful_bins = max_bin - min_bin;
    let reference_db = reference_level_db as f32;
    let noise_gate_db = reference_db - GATE_RANGE_DB;

    for (display_idx, result_bin) in result.iter_mut().enumerate() {
        let start_bin = min_bin + display_idx * useful_bins / num_bins;
        let end_bin = (min_bin + (display_idx + 1) * useful_bins / num_bins)
            .min(max_bin)
            .max(start_bin + 1);

        let band = &buffer[start_bin..end_bin];
        let avg_magnitude = band.iter().map(|c| c.norm()).sum::<f32>() / band.len() as f32;

        // Scale so a full-scale sine lands near 0 dB
        let db = if avg_magnitude > 1e-10 {
            20.0 * (avg_magnitude * 4.0 / FFT_SIZE as f32).log10()
        } else {
            -160.0
        };

        *result_bin = ((db - noise_gate_db) / GATE_RANGE_DB).clamp(0.0, 1.0);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_silence_is_zero() {
        let mut planner = FftPlanner::new();
        let bins = calculate_spectrum(&vec![0.0; FFT_SIZE], 48000, 32, -20, &mut planner);
        assert_eq!(bins, vec![0.0; 32]);
    }

    #[test]
    fn test_empty_input_is_zero() {
        let mut planner = FftPlanner::new();
        assert_eq!(calculate_spectrum(&[], 48000, 8, -20, &mut planner), vec![0.0; 8]);
    }

    #[test]
    fn test_sine_peaks_in_its_band() {
        let mut planner = FftPlanner::new();
        let bins = calculate_spectrum(&sine(1000.0, 48000, FFT_SIZE), 48000, 64, -20, &mut planner);

        let peak = bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        // 1 kHz sits about an eighth of the way through 40 Hz..8 kHz
        assert!((6..=10).contains(&peak), "peak at bin {peak}");
        assert!(bins[peak] > 0.9);
        assert!(bins.iter().all(|&b| (0.0..=1.0).contains(&b)));
    }

    #[test]
    fn test_analyzer_smooths_towards_new_data() {
        let mut analyzer = SpectrumAnalyzer::new(16);
        let tone = sine(440.0, 16000, FFT_SIZE);
        analyzer.update(&tone, 16000, -20);
        let first = analyzer.data().iter().cloned().fold(0.0, f32::max);
        analyzer.update(&tone, 16000, -20);
        let second = analyzer.data().iter().cloned().fold(0.0, f32::max);
        assert!(first > 0.0);
        assert!(second > first);
    }
}
