// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping elapsed time to animation progress.
//!
//! The driver never integrates anything itself. Each property-group timeline
//! holds an [`Interpolator`] that turns the time since the animation started
//! into a progress value in `[0, 1]`. [`Transition`] (delay + duration +
//! easing) is the built-in implementation; [`Spring`] is an analytic
//! damped-spring progress curve for embedders that want spring-like motion
//! without supplying their own integrator.

use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use super::easing::Easing;
use crate::time::Duration;

/// Maps elapsed time to progress.
///
/// Implementations must return `0.0` at (or before) the start and exactly
/// `1.0` once [`is_finished`](Self::is_finished) returns `true`.
pub trait Interpolator: fmt::Debug {
    /// Progress at `elapsed` since the timeline started.
    fn progress(&self, elapsed: Duration) -> f64;

    /// Whether the timeline has settled at `elapsed`.
    fn is_finished(&self, elapsed: Duration) -> bool;
}

/// A timed, eased transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    /// Time before progress starts advancing.
    pub delay: Duration,
    /// Time from the end of the delay to completion.
    pub duration: Duration,
    /// Curve applied to linear progress.
    pub easing: Easing,
}

impl Transition {
    /// The default layout transition: 450 ms, `cubic-bezier(0.4, 0, 0.1, 1)`.
    #[must_use]
    pub const fn layout_default() -> Self {
        Self {
            delay: Duration::ZERO,
            duration: Duration::from_millis(450),
            easing: Easing::CubicBezier(0.4, 0.0, 0.1, 1.0),
        }
    }

    /// A transition that completes on its first sample.
    pub const INSTANT: Self = Self {
        delay: Duration::ZERO,
        duration: Duration::ZERO,
        easing: Easing::Linear,
    };

    /// Creates a transition with no delay.
    #[must_use]
    pub const fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            delay: Duration::ZERO,
            duration,
            easing,
        }
    }

    /// Returns a copy with the given delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns a copy with the given duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns a copy with the given easing.
    #[must_use]
    pub const fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Linear (un-eased) progress at `elapsed`.
    #[must_use]
    pub fn linear_progress(&self, elapsed: Duration) -> f64 {
        let active = elapsed.saturating_sub(self.delay);
        if self.duration.is_zero() {
            return if elapsed >= self.delay { 1.0 } else { 0.0 };
        }
        (active.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::layout_default()
    }
}

impl Interpolator for Transition {
    fn progress(&self, elapsed: Duration) -> f64 {
        self.easing.apply(self.linear_progress(elapsed))
    }

    fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.delay + self.duration
    }
}

/// Progress of an under- or critically-damped spring released from rest at
/// `0.0` towards `1.0`.
///
/// The spring is settled once its displacement from `1.0` stays below
/// `rest_delta`, judged from the decay envelope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
    /// Spring constant.
    pub stiffness: f64,
    /// Damping coefficient.
    pub damping: f64,
    /// Mass of the moving body.
    pub mass: f64,
    /// Displacement below which the spring counts as settled.
    pub rest_delta: f64,
}

impl Spring {
    /// A moderately bouncy default.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stiffness: 100.0,
            damping: 10.0,
            mass: 1.0,
            rest_delta: 0.001,
        }
    }

    /// Returns a copy with the given stiffness and damping.
    #[must_use]
    pub const fn with_params(mut self, stiffness: f64, damping: f64) -> Self {
        self.stiffness = stiffness;
        self.damping = damping;
        self
    }

    fn omega0(&self) -> f64 {
        (self.stiffness / self.mass.max(f64::EPSILON)).sqrt()
    }

    fn zeta(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).max(f64::EPSILON).sqrt())
    }

    /// Displacement from the target at `t` seconds.
    fn displacement(&self, t: f64) -> f64 {
        let w0 = self.omega0();
        let zeta = self.zeta();
        if zeta < 1.0 {
            let wd = w0 * (1.0 - zeta * zeta).sqrt();
            let envelope = (-zeta * w0 * t).exp();
            envelope * ((wd * t).cos() + (zeta * w0 / wd) * (wd * t).sin())
        } else {
            // Critically damped and overdamped springs share the critical curve.
            (-w0 * t).exp() * (1.0 + w0 * t)
        }
    }

    /// Upper bound on the displacement at `t` seconds.
    fn envelope(&self, t: f64) -> f64 {
        let w0 = self.omega0();
        let zeta = self.zeta();
        if zeta < 1.0 {
            let wd = w0 * (1.0 - zeta * zeta).sqrt();
            (-zeta * w0 * t).exp() * (1.0 + zeta * w0 / wd)
        } else {
            (-w0 * t).exp() * (1.0 + w0 * t)
        }
    }
}

impl Default for Spring {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpolator for Spring {
    fn progress(&self, elapsed: Duration) -> f64 {
        if self.is_finished(elapsed) {
            return 1.0;
        }
        1.0 - self.displacement(elapsed.as_secs_f64())
    }

    fn is_finished(&self, elapsed: Duration) -> bool {
        let t = elapsed.as_secs_f64();
        t > 0.0 && self.envelope(t) < self.rest_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_transition() {
        let t = Transition::default();
        assert_eq!(t.duration, Duration::from_millis(450));
        assert_eq!(t.easing, Easing::CubicBezier(0.4, 0.0, 0.1, 1.0));
        assert_eq!(t.progress(Duration::ZERO), 0.0);
        assert_eq!(t.progress(Duration::from_millis(450)), 1.0);
        assert!(t.is_finished(Duration::from_millis(450)));
        assert!(!t.is_finished(Duration::from_millis(449)));
    }

    #[test]
    fn delay_holds_progress_at_zero() {
        let t = Transition::new(Duration::from_millis(100), Easing::Linear)
            .with_delay(Duration::from_millis(50));
        assert_eq!(t.progress(Duration::from_millis(50)), 0.0);
        assert!((t.progress(Duration::from_millis(100)) - 0.5).abs() < 1e-12);
        assert!(t.is_finished(Duration::from_millis(150)));
    }

    #[test]
    fn instant_finishes_immediately() {
        assert_eq!(Transition::INSTANT.progress(Duration::ZERO), 1.0);
        assert!(Transition::INSTANT.is_finished(Duration::ZERO));
    }

    #[test]
    fn spring_starts_at_rest_and_settles() {
        let spring = Spring::new();
        assert!(spring.progress(Duration::ZERO).abs() < 1e-12);
        assert!(!spring.is_finished(Duration::ZERO));
        let late = Duration::from_millis(5_000);
        assert!(spring.is_finished(late));
        assert_eq!(spring.progress(late), 1.0);
    }

    #[test]
    fn underdamped_spring_overshoots() {
        let spring = Spring::new().with_params(300.0, 5.0);
        let peak = (1..100)
            .map(|ms| spring.progress(Duration::from_millis(ms * 5)))
            .fold(0.0_f64, f64::max);
        assert!(peak > 1.0);
    }
}
