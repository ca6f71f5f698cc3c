// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node animation options.

use crate::animation::Transition;
use crate::geometry::{Axis, LayoutBox, TransformOrigin};

/// Which parts of a layout change animate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationType {
    /// Position and size both animate.
    #[default]
    Both,
    /// Only position animates; size snaps to the new layout.
    Position,
    /// Only size animates; position snaps to the new layout.
    Size,
}

impl AnimationType {
    /// Adjusts the box an animation starts from so that the parts that must
    /// not animate already match `target`.
    #[must_use]
    pub fn source_box(self, source: LayoutBox, target: LayoutBox) -> LayoutBox {
        let adjust = |s: Axis, t: Axis| match self {
            Self::Both => s,
            Self::Position => Axis::new(s.min, s.min + t.length()),
            Self::Size => Axis::new(t.min, t.min + s.length()),
        };
        LayoutBox::from_axes(adjust(source.x, target.x), adjust(source.y, target.y))
    }
}

/// Options that tune how a single node animates.
///
/// Fields left as `None` fall back to the
/// [`ProjectionConfig`](crate::config::ProjectionConfig) of the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeOptions {
    /// Transform origin used for the node's delta.
    pub origin: TransformOrigin,
    /// Which parts of a layout change animate.
    pub animation_type: AnimationType,
    /// Transition for the box (transform group).
    pub transition: Option<Transition>,
    /// Transition for border radius and box shadow (style group).
    pub style_transition: Option<Transition>,
    /// Whether shared-identity hand-offs crossfade opacity.
    pub crossfade: Option<bool>,
}

impl NodeOptions {
    /// Returns a copy with the given origin.
    #[must_use]
    pub const fn with_origin(mut self, origin: TransformOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Returns a copy with the given animation type.
    #[must_use]
    pub const fn with_animation_type(mut self, animation_type: AnimationType) -> Self {
        self.animation_type = animation_type;
        self
    }

    /// Returns a copy with the given box transition.
    #[must_use]
    pub const fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Returns a copy with the given style transition.
    #[must_use]
    pub const fn with_style_transition(mut self, transition: Transition) -> Self {
        self.style_transition = Some(transition);
        self
    }

    /// Returns a copy with crossfading turned on or off.
    #[must_use]
    pub const fn with_crossfade(mut self, crossfade: bool) -> Self {
        self.crossfade = Some(crossfade);
        self
    }
}
