//! Time-based value animation.

use cgmath::Point3;

/// Easing applied to linear progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    #[default]
    Linear,
    EaseOut,
    EaseInEaseOut,
}

impl Curve {
    /// Maps linear progress in `[0, 1]` onto the eased progress.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInEaseOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// What happens when a tween reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    /// Stop at the target.
    #[default]
    Once,
    /// Swap start and target and keep going forever.
    LoopBackAndForth,
}

/// Values a tween can blend between.
pub trait Interpolate: Copy {
    fn interpolate(self, other: Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Point3<f32> {
    fn interpolate(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// Animates a value from a start to a target over `duration` seconds.
#[derive(Debug, Clone)]
pub struct Tween<T: Interpolate> {
    from: T,
    to: T,
    duration: f32,
    progress: f32,
    curve: Curve,
    repeat: Repeat,
    animating: bool,
}

impl<T: Interpolate> Tween<T> {
    /// Creates an idle tween resting at `value` with a one second duration.
    pub fn new(value: T) -> Self {
        Self {
            from: value,
            to: value,
            duration: 1.0,
            progress: 0.0,
            curve: Curve::Linear,
            repeat: Repeat::Once,
            animating: false,
        }
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.set_duration(seconds);
        self
    }

    pub fn set_duration(&mut self, seconds: f32) {
        self.duration = seconds.max(f32::EPSILON);
    }

    /// Stops the tween and parks it at `value`.
    pub fn reset(&mut self, value: T) {
        self.from = value;
        self.to = value;
        self.progress = 0.0;
        self.animating = false;
    }

    /// Starts animating from the current value towards `target`.
    pub fn animate_to(&mut self, target: T) {
        self.from = self.value();
        self.to = target;
        self.progress = 0.0;
        self.animating = true;
    }

    /// Advances the animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if !self.animating {
            return;
        }

        self.progress += dt / self.duration;
        if self.progress < 1.0 {
            return;
        }

        match self.repeat {
            Repeat::Once => {
                self.progress = 1.0;
                self.animating = false;
            }
            Repeat::LoopBackAndForth => {
                self.progress = (self.progress - 1.0).min(1.0);
                std::mem::swap(&mut self.from, &mut self.to);
            }
        }
    }

    pub fn value(&self) -> T {
        self.from.interpolate(self.to, self.curve.apply(self.progress))
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curves_hit_endpoints() {
        for curve in [Curve::Linear, Curve::EaseOut, Curve::EaseInEaseOut] {
            assert_eq!(curve.apply(0.0), 0.0);
            assert_eq!(curve.apply(1.0), 1.0);
        }
        assert!(Curve::EaseOut.apply(0.5) > 0.5);
        assert_eq!(Curve::EaseInEaseOut.apply(0.5), 0.5);
    }

    #[test]
    fn test_once_stops_at_target() {
        let mut tween = Tween::new(0.0_f32).with_curve(Curve::EaseOut);
        tween.animate_to(1.0);
        for _ in 0..60 {
            tween.update(0.02);
        }
        assert!(!tween.is_animating());
        assert_eq!(tween.value(), 1.0);
    }

    #[test]
    fn test_reset_restarts_from_value() {
        let mut tween = Tween::new(0.0_f32);
        tween.animate_to(1.0);
        tween.update(0.5);
        tween.reset(0.0);
        assert!(!tween.is_animating());
        assert_eq!(tween.value(), 0.0);
        tween.animate_to(1.0);
        tween.update(0.25);
        assert_eq!(tween.value(), 0.25);
    }

    #[test]
    fn test_back_and_forth_keeps_running() {
        let mut tween = Tween::new(0.0_f32).with_repeat(Repeat::LoopBackAndForth);
        tween.animate_to(2.0);
        tween.update(1.0);
        assert!(tween.is_animating());
        assert_eq!(tween.value(), 2.0);
        tween.update(0.5);
        assert_eq!(tween.value(), 1.0);
        tween.update(0.5);
        assert_eq!(tween.value(), 0.0);
    }

    #[test]
    fn test_points_interpolate_componentwise() {
        let mut tween = Tween::new(Point3::new(0.0_f32, 0.0, 0.0));
        tween.animate_to(Point3::new(2.0, -2.0, 4.0));
        tween.update(0.5);
        assert_eq!(tween.value(), Point3::new(1.0, -1.0, 2.0));
    }
}
