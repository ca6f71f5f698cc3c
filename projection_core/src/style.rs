// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scale-corrected styles.
//!
//! A projection transform scales a node's whole painted output, including
//! properties that should keep their apparent size while the box stretches.
//! [`NodeStyle`] holds the declared values of those properties, and
//! [`NodeStyle::corrected`] divides them by the node's visual scale so that
//! rounded corners and shadows look the same at every frame.
//!
//! [`ProjectedStyle`] bundles the corrected values with the render transform
//! and the crossfade opacity. It is the unit written to the host.

use alloc::format;
use alloc::string::String;

use kurbo::Vec2;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::geometry::mix;
use crate::transform::ProjectionTransform;

fn safe_scale(s: f64) -> f64 {
    if s.is_finite() && s > 0.0 { s } else { 1.0 }
}

/// One elliptical corner radius in layout units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Radius {
    /// Horizontal radius.
    pub x: f64,
    /// Vertical radius.
    pub y: f64,
}

impl Radius {
    /// No rounding.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates an elliptical radius.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a circular radius.
    #[must_use]
    pub const fn circular(r: f64) -> Self {
        Self { x: r, y: r }
    }

    /// Interpolates both components.
    #[must_use]
    pub fn mix(self, to: Self, progress: f64) -> Self {
        Self::new(mix(self.x, to.x, progress), mix(self.y, to.y, progress))
    }

    /// Divides each component by the scale of its axis.
    #[must_use]
    pub fn corrected(self, scale: Vec2) -> Self {
        Self::new(self.x / safe_scale(scale.x), self.y / safe_scale(scale.y))
    }
}

/// Corner radii of a box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BorderRadius {
    /// Top-left corner.
    pub top_left: Radius,
    /// Top-right corner.
    pub top_right: Radius,
    /// Bottom-right corner.
    pub bottom_right: Radius,
    /// Bottom-left corner.
    pub bottom_left: Radius,
}

impl BorderRadius {
    /// Square corners.
    pub const ZERO: Self = Self::uniform(Radius::ZERO);

    /// The same radius on every corner.
    #[must_use]
    pub const fn uniform(r: Radius) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: r,
            bottom_left: r,
        }
    }

    /// Interpolates every corner.
    #[must_use]
    pub fn mix(self, to: Self, progress: f64) -> Self {
        Self {
            top_left: self.top_left.mix(to.top_left, progress),
            top_right: self.top_right.mix(to.top_right, progress),
            bottom_right: self.bottom_right.mix(to.bottom_right, progress),
            bottom_left: self.bottom_left.mix(to.bottom_left, progress),
        }
    }

    /// Divides every corner by the node's visual scale.
    #[must_use]
    pub fn corrected(self, scale: Vec2) -> Self {
        Self {
            top_left: self.top_left.corrected(scale),
            top_right: self.top_right.corrected(scale),
            bottom_right: self.bottom_right.corrected(scale),
            bottom_left: self.bottom_left.corrected(scale),
        }
    }

    /// Formats as a CSS `border-radius` value.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "{}px {}px {}px {}px / {}px {}px {}px {}px",
            self.top_left.x,
            self.top_right.x,
            self.bottom_right.x,
            self.bottom_left.x,
            self.top_left.y,
            self.top_right.y,
            self.bottom_right.y,
            self.bottom_left.y,
        )
    }
}

/// A single outer box shadow.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxShadow {
    /// Horizontal offset.
    pub offset_x: f64,
    /// Vertical offset.
    pub offset_y: f64,
    /// Blur radius.
    pub blur: f64,
    /// Spread distance.
    pub spread: f64,
    /// Straight-alpha RGBA color.
    pub color: [u8; 4],
}

impl BoxShadow {
    /// A transparent shadow with no extent.
    pub const NONE: Self = Self {
        offset_x: 0.0,
        offset_y: 0.0,
        blur: 0.0,
        spread: 0.0,
        color: [0, 0, 0, 0],
    };

    /// Interpolates geometry and color.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "channel values are clamped to the u8 range first"
    )]
    #[must_use]
    pub fn mix(self, to: Self, progress: f64) -> Self {
        let mut color = [0_u8; 4];
        for (i, c) in color.iter_mut().enumerate() {
            let v = mix(f64::from(self.color[i]), f64::from(to.color[i]), progress);
            *c = v.round().clamp(0.0, 255.0) as u8;
        }
        Self {
            offset_x: mix(self.offset_x, to.offset_x, progress),
            offset_y: mix(self.offset_y, to.offset_y, progress),
            blur: mix(self.blur, to.blur, progress),
            spread: mix(self.spread, to.spread, progress),
            color,
        }
    }

    /// Divides offsets by their axis scale, and blur and spread by the mean
    /// of both scales.
    #[must_use]
    pub fn corrected(self, scale: Vec2) -> Self {
        let sx = safe_scale(scale.x);
        let sy = safe_scale(scale.y);
        let average = mix(sx, sy, 0.5);
        Self {
            offset_x: self.offset_x / sx,
            offset_y: self.offset_y / sy,
            blur: self.blur / average,
            spread: self.spread / average,
            color: self.color,
        }
    }

    /// Formats as a CSS `box-shadow` value.
    #[must_use]
    pub fn to_css(&self) -> String {
        let [r, g, b, a] = self.color;
        format!(
            "{}px {}px {}px {}px rgba({r}, {g}, {b}, {})",
            self.offset_x,
            self.offset_y,
            self.blur,
            self.spread,
            f64::from(a) / 255.0,
        )
    }
}

/// Declared values of the scale-sensitive style properties of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeStyle {
    /// Border radius to keep visually constant, if any.
    pub border_radius: Option<BorderRadius>,
    /// Box shadow to keep visually constant, if any.
    pub box_shadow: Option<BoxShadow>,
}

impl NodeStyle {
    /// No corrected properties.
    pub const NONE: Self = Self {
        border_radius: None,
        box_shadow: None,
    };

    /// Whether no property is declared.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.border_radius.is_none() && self.box_shadow.is_none()
    }

    /// Interpolates towards `to`. A property missing on one side mixes with
    /// its zero value.
    #[must_use]
    pub fn mix(&self, to: &Self, progress: f64) -> Self {
        let border_radius = match (self.border_radius, to.border_radius) {
            (None, None) => None,
            (a, b) => Some(
                a.unwrap_or(BorderRadius::ZERO)
                    .mix(b.unwrap_or(BorderRadius::ZERO), progress),
            ),
        };
        let box_shadow = match (self.box_shadow, to.box_shadow) {
            (None, None) => None,
            (a, b) => Some(
                a.unwrap_or(BoxShadow::NONE)
                    .mix(b.unwrap_or(BoxShadow::NONE), progress),
            ),
        };
        Self {
            border_radius,
            box_shadow,
        }
    }

    /// Corrects every declared property for the node's visual `scale`.
    #[must_use]
    pub fn corrected(&self, scale: Vec2) -> Self {
        Self {
            border_radius: self.border_radius.map(|r| r.corrected(scale)),
            box_shadow: self.box_shadow.map(|s| s.corrected(scale)),
        }
    }
}

/// Everything written to a host instance for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProjectedStyle {
    /// Render transform relative to the instance's natural layout.
    pub transform: ProjectionTransform,
    /// Crossfade opacity, or `None` to leave the instance's opacity alone.
    pub opacity: Option<f64>,
    /// Scale-corrected border radius.
    pub border_radius: Option<BorderRadius>,
    /// Scale-corrected box shadow.
    pub box_shadow: Option<BoxShadow>,
}

impl ProjectedStyle {
    /// No transform, no overrides.
    pub const IDENTITY: Self = Self {
        transform: ProjectionTransform::IDENTITY,
        opacity: None,
        border_radius: None,
        box_shadow: None,
    };

    /// Whether writing this style leaves the instance looking as laid out.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.transform.is_identity()
            && self.opacity.is_none()
            && self.border_radius.is_none()
            && self.box_shadow.is_none()
    }
}
