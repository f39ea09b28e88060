//! Radar-style scanner overlay on the floor plane.

use super::{Segment, Shade};

const SCANNER_COLOR: (u8, u8, u8) = (120, 255, 170);
/// Beam positions kept as a fading trail behind the sweep.
const TRAIL: usize = 12;
const TRAIL_SPACING: f32 = 0.06;
const RING_SEGMENTS: usize = 48;

/// Sweeping beam inside a ring. Fill intensity follows the gain average,
/// the ring follows the frame intensity.
#[derive(Debug, Clone)]
pub struct Scanner {
    angle: f32,
    speed: f32,
    radius: f32,
    height: f32,
    fill_alpha: u8,
    frame_alpha: u8,
}

impl Scanner {
    pub fn new(radius: f32, height: f32) -> Self {
        Self {
            angle: 0.0,
            speed: 0.04,
            radius,
            height,
            fill_alpha: 0,
            frame_alpha: 255,
        }
    }

    /// Stores the frame's intensities and moves the beam on.
    pub fn update(&mut self, fill_alpha: u8, frame_alpha: u8) {
        self.fill_alpha = fill_alpha;
        self.frame_alpha = frame_alpha;
        self.angle = (self.angle + self.speed) % std::f32::consts::TAU;
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn fill_alpha(&self) -> u8 {
        self.fill_alpha
    }

    fn rim(&self, angle: f32) -> [f32; 3] {
        [
            self.radius * angle.cos(),
            self.height,
            self.radius * angle.sin(),
        ]
    }

    /// Ring, beam and trail as line segments.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(RING_SEGMENTS + TRAIL);
        let frame = Shade::new(SCANNER_COLOR, self.frame_alpha as f32 / 255.0 * 0.5);

        for i in 0..RING_SEGMENTS {
            let a0 = i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
            let a1 = (i + 1) as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
            segments.push(Segment::new(self.rim(a0), self.rim(a1), frame));
        }

        let centre = [0.0, self.height, 0.0];
        let fill = self.fill_alpha as f32 / 255.0;
        // Oldest trail line first so the beam itself is painted on top
        for step in (0..TRAIL).rev() {
            let fade = 1.0 - step as f32 / TRAIL as f32;
            let alpha = (0.25 + 0.75 * fill) * fade;
            let angle = self.angle - step as f32 * TRAIL_SPACING;
            segments.push(Segment::new(centre, self.rim(angle), Shade::new(SCANNER_COLOR, alpha)));
        }

        segments
    }
}
