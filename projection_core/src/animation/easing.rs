// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easing curves that map linear progress to eased progress.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

const SUBDIVISION_PRECISION: f64 = 1e-7;
const SUBDIVISION_MAX_ITERATIONS: u32 = 12;

/// Easing functions applied to normalized progress in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    /// Identity curve.
    Linear,
    /// `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,
    /// `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,
    /// Circular ease-in, `1 - sqrt(1 - t^2)`.
    CircIn,
    /// Circular ease-out, `sqrt(1 - (1 - t)^2)`.
    CircOut,
    /// CSS-style cubic Bézier with control points `(x1, y1)` and `(x2, y2)`.
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    /// Applies the curve to `t`, clamped to `[0, 1]`.
    ///
    /// The endpoints map exactly to `0.0` and `1.0`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match self {
            Self::Linear => t,
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CircIn => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Self::CircOut => {
                let u = 1.0 - t;
                (1.0 - u * u).max(0.0).sqrt()
            }
            Self::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

/// Remaps `t` so the curve runs only inside `[start, end]`.
///
/// Progress before `start` is `0.0`, after `end` is `1.0`.
#[must_use]
pub fn compress(start: f64, end: f64, easing: Easing, t: f64) -> f64 {
    if t < start {
        0.0
    } else if t > end {
        1.0
    } else if end <= start {
        1.0
    } else {
        easing.apply((t - start) / (end - start))
    }
}

fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x1 == y1 && x2 == y2 {
        return x;
    }
    let t = solve_for_x(x, x1, x2);
    bezier_component(t, y1, y2)
}

/// One component of a Bézier curve through `(0, 0)` and `(1, 1)`.
fn bezier_component(t: f64, a1: f64, a2: f64) -> f64 {
    (((1.0 - 3.0 * a2 + 3.0 * a1) * t + (3.0 * a2 - 6.0 * a1)) * t + 3.0 * a1) * t
}

/// Binary subdivision for the curve parameter whose x component is `x`.
fn solve_for_x(x: f64, x1: f64, x2: f64) -> f64 {
    let mut lower = 0.0;
    let mut upper = 1.0;
    let mut iteration = 0;
    loop {
        let t = lower + (upper - lower) / 2.0;
        let err = bezier_component(t, x1, x2) - x;
        iteration += 1;
        if err.abs() <= SUBDIVISION_PRECISION || iteration >= SUBDIVISION_MAX_ITERATIONS {
            return t;
        }
        if err > 0.0 {
            upper = t;
        } else {
            lower = t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::CircIn,
        Easing::CircOut,
        Easing::CubicBezier(0.4, 0.0, 0.1, 1.0),
    ];

    #[test]
    fn endpoints_are_exact() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?}");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?}");
            assert_eq!(easing.apply(-3.0), 0.0, "{easing:?}");
            assert_eq!(easing.apply(7.0), 1.0, "{easing:?}");
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for easing in ALL {
            let mut prev = 0.0;
            for step in 1..=100 {
                let v = easing.apply(f64::from(step) / 100.0);
                assert!(v + 1e-3 >= prev, "{easing:?} at step {step}");
                prev = v;
            }
        }
    }

    #[test]
    fn linear_bezier_is_identity() {
        let e = Easing::CubicBezier(0.25, 0.25, 0.75, 0.75);
        assert!((e.apply(0.3) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn ease_out_leads_linear() {
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
        assert!(Easing::EaseIn.apply(0.5) < 0.5);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn circ_curves_mirror() {
        let t = 0.3;
        let a = Easing::CircIn.apply(t);
        let b = Easing::CircOut.apply(1.0 - t);
        assert!((a - (1.0 - b)).abs() < 1e-12);
    }

    #[test]
    fn compress_clamps_outside_window() {
        assert_eq!(compress(0.5, 0.95, Easing::Linear, 0.2), 0.0);
        assert_eq!(compress(0.5, 0.95, Easing::Linear, 0.99), 1.0);
        assert!((compress(0.0, 0.5, Easing::Linear, 0.25) - 0.5).abs() < 1e-12);
    }
}
