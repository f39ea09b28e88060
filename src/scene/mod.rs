//! World-space geometry for one frame.
//!
//! Everything visible is reduced to coloured line segments in world space;
//! the renderer only projects and paints them, in list order.

pub mod camera;
pub mod scanner;
pub mod tween;

pub use camera::{OrbitCamera, Projector};
pub use scanner::Scanner;
pub use tween::{Curve, Tween};

use crate::sonify::DepthFrame;
use crate::spectrogram::{AgeTransform, RingHistory};

pub const WHITE: (u8, u8, u8) = (255, 255, 255);
pub const LIGHT_BLUE: (u8, u8, u8) = (173, 216, 230);
pub const FUTURE_GREY: (u8, u8, u8) = (200, 200, 200);
const TOUCH_COLOR: (u8, u8, u8) = (153, 230, 230);
const POINT_COLOR: (u8, u8, u8) = (120, 160, 170);
/// Length of the dash that stands in for one depth point.
const POINT_SIZE: f32 = 0.01;

/// Colour plus opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shade {
    pub rgb: (u8, u8, u8),
    pub alpha: f32,
}

impl Shade {
    pub fn new(rgb: (u8, u8, u8), alpha: f32) -> Self {
        Self {
            rgb,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Colour after blending over a black background.
    pub fn over_black(&self) -> (u8, u8, u8) {
        let scale = |c: u8| (c as f32 * self.alpha).round() as u8;
        (scale(self.rgb.0), scale(self.rgb.1), scale(self.rgb.2))
    }
}

/// One world-space line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: [f32; 3],
    pub to: [f32; 3],
    pub shade: Shade,
}

impl Segment {
    pub fn new(from: [f32; 3], to: [f32; 3], shade: Shade) -> Self {
        Self { from, to, shade }
    }
}

/// Appends a connected strip through `points`.
pub fn polyline<I>(points: I, shade: Shade, out: &mut Vec<Segment>)
where
    I: IntoIterator<Item = [f32; 3]>,
{
    let mut points = points.into_iter();
    let Some(mut previous) = points.next() else {
        return;
    };
    for point in points {
        out.push(Segment::new(previous, point, shade));
        previous = point;
    }
}

/// Host-side copy of a ribbon's flattened vertices.
///
/// Refreshed from the ring only after it has changed, the way a dynamic
/// vertex buffer is re-uploaded once per tick.
#[derive(Debug, Clone, Default)]
pub struct VertexBuffer {
    vertices: Vec<[f32; 3]>,
    width: usize,
}

impl VertexBuffer {
    /// Re-uploads `history` if it changed since the last sync.
    ///
    /// Returns whether an upload happened.
    pub fn sync(&mut self, history: &mut RingHistory) -> bool {
        if !history.take_dirty() {
            return false;
        }
        self.vertices = history.vertices();
        self.width = history.width();
        true
    }

    /// Vertices of ring slot `index`; empty before the first upload.
    fn slot(&self, index: usize) -> &[[f32; 3]] {
        let start = index * self.width;
        self.vertices.get(start..start + self.width).unwrap_or(&[])
    }
}

/// Appends every strip of a ribbon, oldest first, after moving each point
/// through `place`.
pub fn ribbon<P>(
    history: &RingHistory,
    buffer: &VertexBuffer,
    transform: &AgeTransform,
    rgb: (u8, u8, u8),
    place: P,
    out: &mut Vec<Segment>,
) where
    P: Fn([f32; 3]) -> [f32; 3],
{
    history.render(transform, |strip| {
        let points = buffer
            .slot(strip.read_index)
            .iter()
            .map(|v| place(strip.pose.apply(v[0], v[1])));
        polyline(points, Shade::new(rgb, strip.pose.alpha), out);
    });
}

/// Identity placement for the upper ribbon.
pub fn in_place(point: [f32; 3]) -> [f32; 3] {
    point
}

/// Placement of the lower ribbon: rotated half a turn about z, then moved
/// two units down.
pub fn mirrored_below(point: [f32; 3]) -> [f32; 3] {
    [-point[0], -point[1] - 2.0, point[2]]
}

/// Appends one short dash per sampled pixel nearer than `threshold_mm`.
///
/// Every `step`-th column and row is visited. Columns span x in `[-1, 1]`,
/// rows run from y = 1 at the top down to -1, and depth pushes a point
/// back from z = 0 at the sensor to z = 1 at the threshold.
pub fn point_cloud(
    frame: &DepthFrame,
    threshold_mm: f32,
    step: usize,
    out: &mut Vec<Segment>,
) {
    if frame.width == 0 || frame.height == 0 || threshold_mm <= 0.0 {
        return;
    }

    let span = |count: usize, at: usize| {
        if count > 1 {
            at as f32 / (count - 1) as f32
        } else {
            0.5
        }
    };
    let shade = Shade::new(POINT_COLOR, 0.8);

    for row in (0..frame.height).step_by(step.max(1)) {
        for column in (0..frame.width).step_by(step.max(1)) {
            let depth = frame.millimetres[row * frame.width + column] as f32;
            if depth <= 0.0 || depth >= threshold_mm {
                continue;
            }
            let x = span(frame.width, column) * 2.0 - 1.0;
            let y = 1.0 - span(frame.height, row) * 2.0;
            let z = depth / threshold_mm;
            out.push(Segment::new([x, y, z], [x + POINT_SIZE, y, z], shade));
        }
    }
}

/// Wireframe cube spanning `[-1, 1]` on every axis.
pub fn unit_box(shade: Shade) -> Vec<Segment> {
    let corner = |i: usize| {
        [
            if i & 1 == 0 { -1.0 } else { 1.0 },
            if i & 2 == 0 { -1.0 } else { 1.0 },
            if i & 4 == 0 { -1.0 } else { 1.0 },
        ]
    };

    let mut edges = Vec::with_capacity(12);
    for a in 0..8 {
        for axis in [1, 2, 4] {
            if a & axis == 0 {
                edges.push(Segment::new(corner(a), corner(a | axis), shade));
            }
        }
    }
    edges
}

/// Expanding square flashed when someone enters the zone.
///
/// `value` runs from 0 to 1 over the flash; the square grows and fades.
pub fn touch_flash(value: f32) -> Vec<Segment> {
    let half = value * 10.0;
    let shade = Shade::new(TOUCH_COLOR, 1.0 - value);
    let corners = [
        [-half, -half, 0.0],
        [half, -half, 0.0],
        [half, half, 0.0],
        [-half, half, 0.0],
    ];

    let mut out = Vec::with_capacity(4);
    polyline(corners.iter().chain(corners.first()).copied(), shade, &mut out);
    out
}
