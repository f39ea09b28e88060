//! Per-age presentation of ribbon strips.

/// Which end of the ring is drawn nearest and brightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Newest slice in front at full opacity, older slices recede and fade.
    #[default]
    Forward,
    /// Mirror of `Forward`: the newest slice is the farthest one.
    Reverse,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reverse => write!(f, "reverse"),
        }
    }
}

/// Visual parameters that turn a slice's age into a pose.
///
/// Fixed for the lifetime of a ribbon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeTransform {
    /// Depth offset added per step of age.
    pub distance_between_lines: f32,
    /// Horizontal scale added per step of age.
    pub line_spread: f32,
    /// Opacity removed per step of age.
    pub fade_step: f32,
}

impl AgeTransform {
    /// Builds a transform whose fade reaches one half at the oldest slice.
    pub fn new(distance_between_lines: f32, line_spread: f32, capacity: usize) -> Self {
        Self {
            distance_between_lines,
            line_spread,
            fade_step: 0.5 / capacity.max(1) as f32,
        }
    }

    /// Computes the pose of the strip `age` steps behind the write head.
    ///
    /// `Reverse` uses the forward pose of the mirrored age, so both
    /// directions cover exactly the same depth, scale and opacity range.
    pub fn pose(&self, age: usize, capacity: usize, direction: Direction) -> StripPose {
        let step = match direction {
            Direction::Forward => age,
            Direction::Reverse => capacity.saturating_sub(1).saturating_sub(age),
        } as f32;

        StripPose {
            depth: self.distance_between_lines * step,
            scale: 1.0 + self.line_spread * step,
            alpha: (1.0 - self.fade_step * step).clamp(0.0, 1.0),
        }
    }
}

/// Where and how brightly a single strip is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripPose {
    pub depth: f32,
    pub scale: f32,
    pub alpha: f32,
}

impl StripPose {
    /// Places a strip point in ribbon space: widen x by `scale`, then push
    /// the strip back by `depth`.
    pub fn apply(&self, x: f32, y: f32) -> [f32; 3] {
        [x * self.scale, y, self.depth]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_pose_grows_with_age() {
        let transform = AgeTransform::new(0.1, 0.05, 10);
        let newest = transform.pose(0, 10, Direction::Forward);
        let oldest = transform.pose(9, 10, Direction::Forward);

        assert_eq!(newest.depth, 0.0);
        assert_eq!(newest.scale, 1.0);
        assert_eq!(newest.alpha, 1.0);
        assert!(oldest.depth > newest.depth);
        assert!(oldest.scale > newest.scale);
        assert!(oldest.alpha < newest.alpha);
    }

    #[test]
    fn test_reverse_mirrors_forward() {
        let transform = AgeTransform::new(0.1, 0.05, 8);
        for age in 0..8 {
            let reversed = transform.pose(age, 8, Direction::Reverse);
            let mirrored = transform.pose(7 - age, 8, Direction::Forward);
            assert_eq!(reversed, mirrored);
        }
    }

    #[test]
    fn test_fade_never_leaves_unit_range() {
        let transform = AgeTransform {
            distance_between_lines: 0.1,
            line_spread: 0.0,
            fade_step: 0.4,
        };
        let pose = transform.pose(5, 6, Direction::Forward);
        assert_eq!(pose.alpha, 0.0);
    }

    #[test]
    fn test_apply_scales_x_only() {
        let pose = StripPose {
            depth: 0.3,
            scale: 2.0,
            alpha: 1.0,
        };
        assert_eq!(pose.apply(0.5, -0.25), [1.0, -0.25, 0.3]);
    }
}
