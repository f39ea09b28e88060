//! Depth sources and projection of depth frames onto the gain contour.

use super::contour::{GainContour, BASELINE};
use crate::spectrogram::resample_to;

/// One depth image in millimetres, row-major. Zero means no reading.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    pub width: usize,
    pub height: usize,
    pub millimetres: Vec<u16>,
}

impl DepthFrame {
    /// Creates a frame with every pixel at `depth`.
    pub fn filled(width: usize, height: usize, depth: u16) -> Self {
        Self {
            width,
            height,
            millimetres: vec![depth; width * height],
        }
    }

    /// Nearest valid reading in `column`, if any.
    pub fn nearest_in_column(&self, column: usize) -> Option<u16> {
        (0..self.height)
            .filter_map(|row| self.millimetres.get(row * self.width + column).copied())
            .filter(|&d| d > 0)
            .min()
    }
}

/// Anything that produces depth frames.
pub trait DepthSource {
    /// Returns the next frame, or `None` when no new frame is ready yet.
    fn poll(&mut self) -> anyhow::Result<Option<DepthFrame>>;

    /// Human-readable source name for the status line.
    fn name(&self) -> &str;
}

/// Synthetic depth source: one body drifting left and right in front of a
/// far wall, stepping in and out of the scene on a slow cycle.
pub struct SimulatedDepth {
    width: usize,
    height: usize,
    background_mm: u16,
    /// Polls between emitted frames.
    frame_interval: u32,
    polls: u32,
    /// Frames emitted so far; the motion phase is derived from it.
    steps: u64,
}

impl SimulatedDepth {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            background_mm: 4000,
            frame_interval: 2,
            polls: 0,
            steps: 0,
        }
    }

    fn phase(&self) -> f64 {
        self.steps as f64 * 0.05
    }

    fn render_frame(&self) -> DepthFrame {
        let mut frame = DepthFrame::filled(self.width, self.height, self.background_mm);

        // Presence cycle is much slower than the sway so entries and exits
        // happen every few seconds.
        let phase = self.phase();
        let present = (phase * 0.15).sin() > -0.2;
        if !present {
            return frame;
        }

        let centre = (0.5 + 0.35 * phase.sin() as f32) * self.width as f32;
        let radius = self.width as f32 * 0.12;
        let depth_mm = 700.0 + 250.0 * (phase * 0.7).cos() as f32;

        for column in 0..self.width {
            let offset = (column as f32 - centre).abs();
            if offset > radius {
                continue;
            }
            // Rounded body profile: the centre is nearest
            let bulge = 1.0 - (offset / radius).powi(2);
            let depth = (depth_mm + 200.0 * (1.0 - bulge)) as u16;
            for row in self.height / 4..self.height {
                frame.millimetres[row * self.width + column] = depth;
            }
        }

        frame
    }
}

impl DepthSource for SimulatedDepth {
    fn poll(&mut self) -> anyhow::Result<Option<DepthFrame>> {
        self.polls = self.polls.wrapping_add(1);
        if self.polls % self.frame_interval != 0 {
            return Ok(None);
        }
        self.steps = self.steps.wrapping_add(1);
        Ok(Some(self.render_frame()))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// Raises contour columns where something is closer than `threshold_mm`.
///
/// Closer readings give higher columns: a reading at the sensor maps to `1`
/// and a reading at the threshold maps to `-1`. The contour is expected to
/// be reset beforehand.
pub fn project_frame(frame: &DepthFrame, contour: &mut GainContour, threshold_mm: f32) {
    if frame.width == 0 || contour.width() == 0 || threshold_mm <= 0.0 {
        return;
    }

    let columns: Vec<f32> = (0..frame.width)
        .map(|column| match frame.nearest_in_column(column) {
            Some(depth) if (depth as f32) < threshold_mm => {
                1.0 - 2.0 * depth as f32 / threshold_mm
            }
            _ => BASELINE,
        })
        .collect();

    for (column, height) in resample_to(&columns, contour.width()).into_iter().enumerate() {
        // Widths match by construction
        let _ = contour.set(column, height);
    }
}
