// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render transform written to a host instance.
//!
//! A [`ProjectionTransform`] is expressed in the instance's own (pre-ancestor)
//! coordinate space: scale around the transform origin of the node's
//! measured box, then translate. Hosts that speak CSS can use
//! [`to_css`](ProjectionTransform::to_css) and
//! [`origin_css`](ProjectionTransform::origin_css) directly; hosts with a
//! scene graph can use [`to_affine`](ProjectionTransform::to_affine).

use alloc::format;
use alloc::string::String;

use kurbo::{Affine, Vec2};

use crate::geometry::{BoxDelta, LayoutBox, TransformOrigin};

/// Per-axis translate and scale around a fractional origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionTransform {
    /// Translation in the instance's local units.
    pub translate: Vec2,
    /// Residual scale after ancestor scale is accounted for.
    pub scale: Vec2,
    /// Fractional scale origin within the measured box.
    pub origin: TransformOrigin,
}

impl Default for ProjectionTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ProjectionTransform {
    /// No translation, unit scale, top-left origin.
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: Vec2::new(1.0, 1.0),
        origin: TransformOrigin::TOP_LEFT,
    };

    /// Builds the transform that realizes `delta` (expressed in viewport
    /// space) underneath ancestors whose combined scale is `parent_scale`.
    ///
    /// Ancestor scale already stretches this node's local space, so the
    /// translation is divided by it. Scales of per-axis maps commute, which
    /// leaves the delta's own scale as the residual.
    #[must_use]
    pub fn from_delta(delta: &BoxDelta, parent_scale: Vec2) -> Self {
        let px = if parent_scale.x > 0.0 { parent_scale.x } else { 1.0 };
        let py = if parent_scale.y > 0.0 { parent_scale.y } else { 1.0 };
        Self {
            translate: Vec2::new(delta.x.translate / px, delta.y.translate / py),
            scale: delta.scale(),
            origin: TransformOrigin::new(delta.x.origin, delta.y.origin),
        }
    }

    /// Whether this transform leaves the instance where it was laid out.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.translate == Vec2::ZERO && self.scale == Vec2::new(1.0, 1.0)
    }

    /// Returns the transform as an affine map in the coordinate space of
    /// `measured`.
    #[must_use]
    pub fn to_affine(&self, measured: LayoutBox) -> Affine {
        let o = Vec2::new(
            measured.x.point_at(self.origin.x),
            measured.y.point_at(self.origin.y),
        );
        Affine::translate(self.translate + o)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-o)
    }

    /// Formats as a CSS `transform` value, or `"none"` for identity.
    #[must_use]
    pub fn to_css(&self) -> String {
        if self.is_identity() {
            return String::from("none");
        }
        format!(
            "translate3d({}px, {}px, 0) scale({}, {})",
            self.translate.x, self.translate.y, self.scale.x, self.scale.y
        )
    }

    /// Formats the origin as a CSS `transform-origin` value.
    #[must_use]
    pub fn origin_css(&self) -> String {
        format!(
            "{}% {}% 0",
            self.origin.x * 100.0,
            self.origin.y * 100.0
        )
    }
}
