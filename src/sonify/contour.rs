//! Proximity contour and the gain curve derived from it.
//!
//! The contour holds one height per sensor column in `[-1, 1]`, where `-1`
//! means nothing is near that column. Gains are the contour resampled to
//! the synthesis bin count and mapped into `[0, 1]`.

use crate::spectrogram::resample;
use thiserror::Error;

/// Height of a column with nothing in range.
pub const BASELINE: f32 = -1.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContourError {
    #[error("column {column} is outside a contour of {width} columns")]
    OutOfRange { column: usize, width: usize },
}

/// Totals of one gain pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GainSummary {
    pub sum: f32,
    pub average: f32,
}

#[derive(Debug, Clone)]
pub struct GainContour {
    heights: Vec<f32>,
}

impl GainContour {
    pub fn new(width: usize) -> Self {
        Self {
            heights: vec![BASELINE; width],
        }
    }

    /// Drops every column back to the baseline before a new depth frame.
    pub fn reset(&mut self) {
        self.heights.fill(BASELINE);
    }

    /// Sets the height of one column.
    ///
    /// # Errors
    /// - If `column` is past the contour width
    pub fn set(&mut self, column: usize, height: f32) -> Result<(), ContourError> {
        let width = self.heights.len();
        let slot = self
            .heights
            .get_mut(column)
            .ok_or(ContourError::OutOfRange { column, width })?;
        *slot = height.clamp(-1.0, 1.0);
        Ok(())
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn width(&self) -> usize {
        self.heights.len()
    }

    /// Writes one gain per entry of `out` and returns their sum and mean.
    pub fn gains(&self, out: &mut [f32]) -> GainSummary {
        resample(&self.heights, out);

        let mut sum = 0.0;
        for gain in out.iter_mut() {
            *gain = ((*gain + 1.0) * 0.5).clamp(0.0, 1.0);
            sum += *gain;
        }

        GainSummary {
            sum,
            average: if out.is_empty() { 0.0 } else { sum / out.len() as f32 },
        }
    }

    /// Polyline of the contour across `[-1, 1)`.
    pub fn points(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        let half = self.heights.len() as f32 / 2.0;
        self.heights
            .iter()
            .enumerate()
            .map(move |(i, &y)| (i as f32 / half - 1.0, y))
    }
}

/// Scanner fill intensity for an average gain.
pub fn fill_alpha(average: f32) -> u8 {
    (average * 1024.0).clamp(0.0, 255.0) as u8
}
