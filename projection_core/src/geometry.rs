// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis, box, and delta primitives.
//!
//! A [`LayoutBox`] is a pair of [`Axis`] ranges in viewport space. A
//! [`BoxDelta`] is a per-axis affine map (`translate` + `scale` around an
//! origin point) between two boxes. Applying a delta to a coordinate `p`
//! yields:
//!
//! ```text
//! origin_point + scale * (p - origin_point) + translate
//! ```
//!
//! Deltas are computed from a *source* box onto a *target* box with
//! [`BoxDelta::between`]. Scale ratios use lengths clamped to
//! [`MIN_LENGTH`], so zero-area boxes never divide by zero.

use kurbo::Rect;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Smallest length used when computing a scale ratio.
pub const MIN_LENGTH: f64 = 1.0;

/// Translations smaller than this (in layout units) snap to zero.
pub const TRANSLATE_EPSILON: f64 = 0.01;

/// Scale factors within this distance of `1.0` snap to `1.0`.
pub const SCALE_EPSILON: f64 = 1e-4;

/// Linear interpolation between `from` and `to`.
#[inline]
#[must_use]
pub fn mix(from: f64, to: f64, progress: f64) -> f64 {
    from + (to - from) * progress
}

/// A closed range along one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Axis {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Axis {
    /// The empty range at the origin.
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    /// Creates a range.
    #[inline]
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `max - min`.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.max - self.min
    }

    /// Returns the length clamped to [`MIN_LENGTH`].
    #[inline]
    #[must_use]
    pub fn clamped_length(self) -> f64 {
        let len = self.length();
        if len.is_finite() && len > MIN_LENGTH {
            len
        } else {
            MIN_LENGTH
        }
    }

    /// Whether the range has zero, negative, or non-finite length.
    #[inline]
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        !(self.length() > 0.0 && self.length().is_finite())
    }

    /// Returns the coordinate at fraction `origin` between `min` and `max`.
    #[inline]
    #[must_use]
    pub fn point_at(self, origin: f64) -> f64 {
        mix(self.min, self.max, origin)
    }

    /// Returns the range with `max` raised to `min` if it was below it.
    #[inline]
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.max < self.min {
            Self::new(self.min, self.min)
        } else {
            self
        }
    }

    /// Interpolates both bounds.
    #[inline]
    #[must_use]
    pub fn mix(self, to: Self, progress: f64) -> Self {
        Self::new(
            mix(self.min, to.min, progress),
            mix(self.max, to.max, progress),
        )
    }

    /// Whether both bounds are within `eps` of `other`.
    #[inline]
    #[must_use]
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        (self.min - other.min).abs() < eps && (self.max - other.max).abs() < eps
    }

    /// Whether both bounds round to the same whole unit as `other`.
    #[inline]
    #[must_use]
    pub fn rounded_eq(self, other: Self) -> bool {
        self.min.round() == other.min.round() && self.max.round() == other.max.round()
    }
}

/// A rectangle in viewport space, expressed as two axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutBox {
    /// Horizontal range.
    pub x: Axis,
    /// Vertical range.
    pub y: Axis,
}

impl LayoutBox {
    /// The empty box at the origin.
    pub const ZERO: Self = Self {
        x: Axis::ZERO,
        y: Axis::ZERO,
    };

    /// Creates a box from its two axes.
    #[inline]
    #[must_use]
    pub const fn from_axes(x: Axis, y: Axis) -> Self {
        Self { x, y }
    }

    /// Creates a box from edge coordinates.
    #[inline]
    #[must_use]
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: Axis::new(x0, x1),
            y: Axis::new(y0, y1),
        }
    }

    /// Box width.
    #[inline]
    #[must_use]
    pub fn width(self) -> f64 {
        self.x.length()
    }

    /// Box height.
    #[inline]
    #[must_use]
    pub fn height(self) -> f64 {
        self.y.length()
    }

    /// Whether either axis is degenerate (zero area).
    #[inline]
    #[must_use]
    pub fn is_degenerate(self) -> bool {
        self.x.is_degenerate() || self.y.is_degenerate()
    }

    /// Returns the box with both axes normalized.
    #[inline]
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::from_axes(self.x.normalized(), self.y.normalized())
    }

    /// Interpolates both axes.
    #[inline]
    #[must_use]
    pub fn mix(self, to: Self, progress: f64) -> Self {
        Self::from_axes(self.x.mix(to.x, progress), self.y.mix(to.y, progress))
    }

    /// Whether every edge is within `eps` of `other`.
    #[inline]
    #[must_use]
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        self.x.approx_eq(other.x, eps) && self.y.approx_eq(other.y, eps)
    }

    /// Whether every edge rounds to the same whole unit as `other`.
    #[inline]
    #[must_use]
    pub fn rounded_eq(self, other: Self) -> bool {
        self.x.rounded_eq(other.x) && self.y.rounded_eq(other.y)
    }

    /// Converts to a [`kurbo::Rect`].
    #[inline]
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x.min, self.y.min, self.x.max, self.y.max)
    }
}

impl From<Rect> for LayoutBox {
    #[inline]
    fn from(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.x1, rect.y1)
    }
}

impl From<LayoutBox> for Rect {
    #[inline]
    fn from(b: LayoutBox) -> Self {
        b.to_rect()
    }
}

/// Fractional transform origin within a box (`0.0` = min edge, `1.0` = max).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformOrigin {
    /// Horizontal fraction.
    pub x: f64,
    /// Vertical fraction.
    pub y: f64,
}

impl TransformOrigin {
    /// Top-left corner.
    pub const TOP_LEFT: Self = Self { x: 0.0, y: 0.0 };
    /// Box center.
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };

    /// Creates an origin from two fractions.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for TransformOrigin {
    fn default() -> Self {
        Self::TOP_LEFT
    }
}

/// Per-axis affine map: scale around `origin_point`, then translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisDelta {
    /// Offset applied after scaling.
    pub translate: f64,
    /// Scale factor around `origin_point`.
    pub scale: f64,
    /// Fraction of the source axis used as the scale origin.
    pub origin: f64,
    /// Absolute coordinate of the scale origin.
    pub origin_point: f64,
}

impl Default for AxisDelta {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AxisDelta {
    /// The identity map.
    pub const IDENTITY: Self = Self {
        translate: 0.0,
        scale: 1.0,
        origin: 0.0,
        origin_point: 0.0,
    };

    /// Computes the map that takes `source` onto `target`.
    ///
    /// Near-identity components snap to identity, and non-finite results
    /// collapse to identity.
    #[must_use]
    pub fn between(source: Axis, target: Axis, origin: f64) -> Self {
        let origin_point = source.point_at(origin);
        let mut scale = target.clamped_length() / source.clamped_length();
        if !scale.is_finite() || (scale - 1.0).abs() < SCALE_EPSILON {
            scale = 1.0;
        }
        let mut translate = target.point_at(origin) - origin_point;
        if !translate.is_finite() || translate.abs() < TRANSLATE_EPSILON {
            translate = 0.0;
        }
        Self {
            translate,
            scale,
            origin,
            origin_point: if origin_point.is_finite() {
                origin_point
            } else {
                0.0
            },
        }
    }

    /// Maps a single coordinate.
    #[inline]
    #[must_use]
    pub fn apply_point(&self, p: f64) -> f64 {
        self.origin_point + self.scale * (p - self.origin_point) + self.translate
    }

    /// Maps both bounds of `axis`.
    #[inline]
    #[must_use]
    pub fn apply(&self, axis: Axis) -> Axis {
        Axis::new(self.apply_point(axis.min), self.apply_point(axis.max))
    }

    /// Whether this delta leaves every coordinate unchanged.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.translate == 0.0 && self.scale == 1.0
    }

    /// Interpolates translate and scale towards identity.
    ///
    /// `progress == 0.0` returns `self`; `progress == 1.0` returns identity
    /// (anchored at the same origin point).
    #[inline]
    #[must_use]
    pub fn mix_to_identity(&self, progress: f64) -> Self {
        let remaining = 1.0 - progress;
        Self {
            translate: self.translate * remaining,
            scale: mix(self.scale, 1.0, progress),
            origin: self.origin,
            origin_point: self.origin_point,
        }
    }

    /// Returns the map equivalent to applying `self` and then `next`.
    #[must_use]
    pub fn then(&self, next: &Self) -> Self {
        let o = self.origin_point;
        let image_of_origin = next.apply_point(o + self.translate);
        Self {
            translate: image_of_origin - o,
            scale: self.scale * next.scale,
            origin: self.origin,
            origin_point: o,
        }
    }

    /// Returns the map that undoes `self`.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let scale = if self.scale == 0.0 || !self.scale.is_finite() {
            1.0
        } else {
            1.0 / self.scale
        };
        Self {
            translate: -self.translate,
            scale,
            origin: self.origin,
            origin_point: self.origin_point + self.translate,
        }
    }
}

/// A per-axis affine map between two boxes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxDelta {
    /// Horizontal component.
    pub x: AxisDelta,
    /// Vertical component.
    pub y: AxisDelta,
}

impl BoxDelta {
    /// The identity map.
    pub const IDENTITY: Self = Self {
        x: AxisDelta::IDENTITY,
        y: AxisDelta::IDENTITY,
    };

    /// Computes the map that takes `source` onto `target`.
    #[inline]
    #[must_use]
    pub fn between(source: LayoutBox, target: LayoutBox, origin: TransformOrigin) -> Self {
        Self {
            x: AxisDelta::between(source.x, target.x, origin.x),
            y: AxisDelta::between(source.y, target.y, origin.y),
        }
    }

    /// Maps a box.
    #[inline]
    #[must_use]
    pub fn apply(&self, b: LayoutBox) -> LayoutBox {
        LayoutBox::from_axes(self.x.apply(b.x), self.y.apply(b.y))
    }

    /// Whether both axes are identity.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.x.is_identity() && self.y.is_identity()
    }

    /// Interpolates both axes towards identity.
    #[inline]
    #[must_use]
    pub fn mix_to_identity(&self, progress: f64) -> Self {
        Self {
            x: self.x.mix_to_identity(progress),
            y: self.y.mix_to_identity(progress),
        }
    }

    /// Returns the map equivalent to applying `self` and then `next`.
    #[inline]
    #[must_use]
    pub fn then(&self, next: &Self) -> Self {
        Self {
            x: self.x.then(&next.x),
            y: self.y.then(&next.y),
        }
    }

    /// Returns the map that undoes `self`.
    #[inline]
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            x: self.x.inverse(),
            y: self.y.inverse(),
        }
    }

    /// Scale factors of both axes.
    #[inline]
    #[must_use]
    pub fn scale(&self) -> kurbo::Vec2 {
        kurbo::Vec2::new(self.x.scale, self.y.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn between_maps_source_onto_target() {
        let source = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let target = LayoutBox::new(50.0, 50.0, 250.0, 150.0);
        let delta = BoxDelta::between(source, target, TransformOrigin::CENTER);
        assert!(delta.apply(source).approx_eq(target, EPS));
        assert!((delta.x.scale - 2.0).abs() < EPS);
        assert!((delta.y.scale - 1.0).abs() < EPS);
    }

    #[test]
    fn widening_from_left_edge_is_pure_scale() {
        let previous = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let measured = LayoutBox::new(0.0, 0.0, 200.0, 100.0);
        let delta = BoxDelta::between(measured, previous, TransformOrigin::TOP_LEFT);
        assert_eq!(delta.x.translate, 0.0);
        assert!((delta.x.scale - 0.5).abs() < EPS);
        assert!(delta.y.is_identity());
    }

    #[test]
    fn degenerate_lengths_are_clamped() {
        let source = Axis::new(10.0, 10.0);
        let target = Axis::new(0.0, 50.0);
        let delta = AxisDelta::between(source, target, 0.0);
        assert!(delta.scale.is_finite());
        assert!((delta.scale - 50.0).abs() < EPS);
        assert!(source.is_degenerate());
        assert!(!target.is_degenerate());
    }

    #[test]
    fn near_identity_snaps() {
        let delta = AxisDelta::between(Axis::new(0.0, 100.0), Axis::new(0.004, 100.004), 0.5);
        assert!(delta.is_identity());
    }

    #[test]
    fn mix_to_identity_interpolates_edges_linearly() {
        let source = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let target = LayoutBox::new(40.0, 20.0, 240.0, 60.0);
        let delta = BoxDelta::between(target, source, TransformOrigin::CENTER);
        for step in 0..=10 {
            let p = f64::from(step) / 10.0;
            let got = delta.mix_to_identity(p).apply(target);
            assert!(got.approx_eq(source.mix(target, p), 1e-6), "step {step}");
        }
        assert!(delta.mix_to_identity(1.0).is_identity());
    }

    #[test]
    fn composition_is_associative() {
        let a = AxisDelta::between(Axis::new(0.0, 10.0), Axis::new(5.0, 25.0), 0.5);
        let b = AxisDelta::between(Axis::new(3.0, 9.0), Axis::new(0.0, 3.0), 0.0);
        let c = AxisDelta::between(Axis::new(-4.0, 4.0), Axis::new(1.0, 17.0), 1.0);
        for p in [-7.0, 0.0, 3.5, 100.0] {
            let left = a.then(&b).then(&c).apply_point(p);
            let right = a.then(&b.then(&c)).apply_point(p);
            assert!((left - right).abs() < EPS, "p = {p}");
            let step = c.apply_point(b.apply_point(a.apply_point(p)));
            assert!((left - step).abs() < EPS, "p = {p}");
        }
    }

    #[test]
    fn composition_is_not_commutative() {
        let a = AxisDelta::between(Axis::new(0.0, 10.0), Axis::new(0.0, 20.0), 0.0);
        let b = AxisDelta::between(Axis::new(0.0, 10.0), Axis::new(5.0, 15.0), 0.0);
        assert!((a.then(&b).apply_point(10.0) - b.then(&a).apply_point(10.0)).abs() > 1.0);
    }

    #[test]
    fn inverse_undoes_delta() {
        let delta = BoxDelta::between(
            LayoutBox::new(10.0, 20.0, 110.0, 70.0),
            LayoutBox::new(-30.0, 0.0, 170.0, 25.0),
            TransformOrigin::CENTER,
        );
        let round_trip = delta.then(&delta.inverse());
        let probe = LayoutBox::new(3.0, -8.0, 41.0, 99.0);
        assert!(round_trip.apply(probe).approx_eq(probe, 1e-9));
    }

    #[test]
    fn rect_conversion_normalizes() {
        let b = LayoutBox::from(Rect::new(10.0, 30.0, 0.0, 20.0));
        assert_eq!(b, LayoutBox::new(0.0, 20.0, 10.0, 30.0));
        assert_eq!(Rect::from(b), Rect::new(0.0, 20.0, 10.0, 30.0));
    }

    #[test]
    fn rounded_equality_ignores_subpixel_noise() {
        let a = LayoutBox::new(0.2, 0.0, 99.8, 50.0);
        let b = LayoutBox::new(0.0, 0.1, 100.0, 50.3);
        assert!(a.rounded_eq(b));
        assert!(!a.rounded_eq(LayoutBox::new(0.0, 0.0, 101.0, 50.0)));
    }
}
