//! Drifting perspective camera.

use cgmath::{perspective, Deg, Matrix4, Point3, Vector3, Vector4};

use super::tween::{Curve, Repeat, Tween};
use crate::config::CameraConfig;

const NEAR_CLIP: f32 = 0.01;
const FAR_CLIP: f32 = 500.0;

/// Camera whose eye and look-at point sway between two configured poses.
///
/// A manual pose, when set, overrides the animation without stopping it.
pub struct OrbitCamera {
    eye: Tween<Point3<f32>>,
    look_at: Tween<Point3<f32>>,
    manual: Option<(Point3<f32>, Point3<f32>)>,
    speed: f32,
    fov: Deg<f32>,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig) -> Self {
        let mut eye = Tween::new(Point3::from(config.eye_from))
            .with_curve(Curve::EaseInEaseOut)
            .with_repeat(Repeat::LoopBackAndForth);
        eye.animate_to(Point3::from(config.eye_to));

        let mut look_at = Tween::new(Point3::from(config.look_at_from))
            .with_curve(Curve::EaseInEaseOut)
            .with_repeat(Repeat::LoopBackAndForth);
        look_at.animate_to(Point3::from(config.look_at_to));

        Self {
            eye,
            look_at,
            manual: None,
            speed: config.speed,
            fov: Deg(config.fov_deg),
        }
    }

    /// Advances the sway by one frame.
    pub fn update(&mut self) {
        self.eye.update(self.speed);
        self.look_at.update(self.speed);
    }

    /// Pins the camera to a fixed pose, or returns to the sway with `None`.
    pub fn set_manual(&mut self, pose: Option<(Point3<f32>, Point3<f32>)>) {
        self.manual = pose;
    }

    /// Current `(eye, look_at)` pair.
    pub fn pose(&self) -> (Point3<f32>, Point3<f32>) {
        self.manual
            .unwrap_or_else(|| (self.eye.value(), self.look_at.value()))
    }

    /// Projection for the current pose and a viewport aspect ratio.
    pub fn projector(&self, aspect: f32) -> Projector {
        let (eye, target) = self.pose();
        let view = Matrix4::look_at_rh(eye, target, Vector3::unit_y());
        let proj = perspective(self.fov, aspect.max(f32::EPSILON), NEAR_CLIP, FAR_CLIP);
        Projector { matrix: proj * view }
    }
}

/// Maps world points to normalised device coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    matrix: Matrix4<f32>,
}

impl Projector {
    /// Projects `point` to `(x, y)` in `[-1, 1]`-ish device space.
    ///
    /// Returns `None` for points behind the eye or outside the clip depth.
    pub fn project(&self, point: [f32; 3]) -> Option<(f64, f64)> {
        let clip = self.matrix * Vector4::new(point[0], point[1], point[2], 1.0);
        if clip.w <= NEAR_CLIP || clip.z > clip.w {
            return None;
        }
        Some(((clip.x / clip.w) as f64, (clip.y / clip.w) as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(eye: [f32; 3], target: [f32; 3]) -> OrbitCamera {
        let mut camera = OrbitCamera::new(&CameraConfig::default());
        camera.set_manual(Some((Point3::from(eye), Point3::from(target))));
        camera
    }

    #[test]
    fn test_target_projects_to_centre() {
        let camera = fixed([0.0, 0.0, -4.0], [0.0, 0.0, 0.0]);
        let (x, y) = camera.projector(1.0).project([0.0, 0.0, 0.0]).unwrap();
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_points_behind_eye_are_culled() {
        let camera = fixed([0.0, 0.0, -4.0], [0.0, 0.0, 0.0]);
        assert!(camera.projector(1.0).project([0.0, 0.0, -6.0]).is_none());
    }

    #[test]
    fn test_right_and_up_keep_their_sides() {
        // Looking down +z with y up, +x lands on the left of the screen
        let camera = fixed([0.0, 0.0, -4.0], [0.0, 0.0, 0.0]);
        let projector = camera.projector(1.0);
        let (x, _) = projector.project([1.0, 0.0, 0.0]).unwrap();
        let (_, y) = projector.project([0.0, 1.0, 0.0]).unwrap();
        assert!(x < 0.0);
        assert!(y > 0.0);
    }

    #[test]
    fn test_sway_moves_eye_until_manual_override() {
        let mut camera = OrbitCamera::new(&CameraConfig::default());
        let start = camera.pose();
        for _ in 0..50 {
            camera.update();
        }
        assert_ne!(camera.pose(), start);

        let pinned = (Point3::new(1.0, 2.0, 3.0), Point3::new(0.0, 0.0, 0.0));
        camera.set_manual(Some(pinned));
        camera.update();
        assert_eq!(camera.pose(), pinned);
    }
}
