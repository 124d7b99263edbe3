//! Animation steps: a target visual state plus the transition used to reach it.

use std::time::Duration;

use crate::core::easing::Easing;
use crate::core::geometry::Point;

const DEFAULT_TRANSITION_MS: u64 = 300;

/// What the render surface should draw for a slot.
///
/// A `None` position means "surface default" (normally the centre of the region).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualState {
    pub position: Option<Point>,
    pub opacity: f64,
    pub scale: f64,
}

impl VisualState {
    /// Fully opaque, unscaled, surface-default position.
    pub const NEUTRAL: Self = Self {
        position: None,
        opacity: 1.0,
        scale: 1.0,
    };

    /// Interpolates towards `target`.
    ///
    /// Positions are only blended when both sides have one; otherwise the target
    /// position is used as-is.
    pub fn lerp(&self, target: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |from: f64, to: f64| from + (to - from) * t;
        let position = match (self.position, target.position) {
            (Some(from), Some(to)) => Some(Point::new(mix(from.x, to.x), mix(from.y, to.y))),
            (_, to) => to,
        };
        Self {
            position,
            opacity: mix(self.opacity, target.opacity),
            scale: mix(self.scale, target.scale),
        }
    }
}

impl Default for VisualState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Easing curve and duration for one state change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub easing: Easing,
    pub duration: Duration,
}

impl Transition {
    /// Instant change.
    pub const NONE: Self = Self {
        easing: Easing::Linear,
        duration: Duration::ZERO,
    };

    pub const fn new(easing: Easing, duration: Duration) -> Self {
        Self { easing, duration }
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            easing: Easing::EaseInOut,
            duration: Duration::from_millis(DEFAULT_TRANSITION_MS),
        }
    }
}

/// One keyframe of an overlay's path.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationStep {
    pub state: VisualState,
    pub transition: Transition,
}

impl AnimationStep {
    pub fn new(state: VisualState, transition: Transition) -> Self {
        Self { state, transition }
    }

    /// Default transition towards `point`.
    pub fn at(point: Point) -> Self {
        Self::default().with_position(Some(point))
    }

    /// Replaces the position; `None` keeps whatever the step already had.
    #[must_use]
    pub fn with_position(mut self, position: Option<Point>) -> Self {
        if position.is_some() {
            self.state.position = position;
        }
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.state.opacity = opacity;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.state.scale = scale;
        self
    }

    #[must_use]
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.transition.duration = duration;
        self
    }

    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.transition.easing = easing;
        self
    }

    pub fn duration(&self) -> Duration {
        self.transition.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_position_none_keeps_existing_point() {
        let step = AnimationStep::at(Point::new(3.0, 4.0)).with_position(None);
        assert_eq!(step.state.position, Some(Point::new(3.0, 4.0)));

        let moved = step.with_position(Some(Point::new(9.0, 9.0)));
        assert_eq!(moved.state.position, Some(Point::new(9.0, 9.0)));
    }

    #[test]
    fn default_step_is_neutral_with_default_transition() {
        let step = AnimationStep::default();
        assert_eq!(step.state, VisualState::NEUTRAL);
        assert_eq!(step.duration(), Duration::from_millis(300));
        assert_eq!(step.transition.easing, Easing::EaseInOut);
    }

    #[test]
    fn lerp_blends_opacity_scale_and_position() {
        let from = VisualState {
            position: Some(Point::new(0.0, 10.0)),
            opacity: 0.0,
            scale: 0.5,
        };
        let to = VisualState {
            position: Some(Point::new(100.0, 10.0)),
            opacity: 1.0,
            scale: 1.0,
        };
        let mid = from.lerp(&to, 0.5);
        assert_eq!(mid.position, Some(Point::new(50.0, 10.0)));
        assert!((mid.opacity - 0.5).abs() < 1e-9);
        assert!((mid.scale - 0.75).abs() < 1e-9);
    }

    #[test]
    fn lerp_snaps_when_a_position_is_missing() {
        let from = VisualState::NEUTRAL;
        let to = VisualState {
            position: Some(Point::new(7.0, 7.0)),
            ..VisualState::NEUTRAL
        };
        assert_eq!(from.lerp(&to, 0.1).position, Some(Point::new(7.0, 7.0)));
        assert_eq!(to.lerp(&from, 0.9).position, None);
    }
}
