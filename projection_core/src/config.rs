// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Controller-wide defaults.

use crate::animation::{Easing, Transition};
use crate::geometry::TransformOrigin;
use crate::node::{AnimationType, NodeOptions};
use crate::time::Duration;

/// Defaults for every node of a [`LayoutProjection`](crate::controller::LayoutProjection).
///
/// Per-node [`NodeOptions`] override the transitions and crossfade flag; the
/// origin and animation type seed the options of newly created nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionConfig {
    /// Transition for layout boxes.
    pub layout_transition: Transition,
    /// Transition for border radius and box shadow.
    pub style_transition: Transition,
    /// Timeline of a shared-identity crossfade.
    pub crossfade_transition: Transition,
    /// Whether shared-identity hand-offs crossfade opacity.
    pub crossfade: bool,
    /// Transform origin given to new nodes.
    pub origin: TransformOrigin,
    /// Animation type given to new nodes.
    pub animation_type: AnimationType,
}

impl ProjectionConfig {
    /// The standard configuration: 450 ms layout transitions, linear
    /// crossfades, top-left origin.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            layout_transition: Transition::layout_default(),
            style_transition: Transition::layout_default(),
            crossfade_transition: Transition::new(Duration::from_millis(450), Easing::Linear),
            crossfade: true,
            origin: TransformOrigin::TOP_LEFT,
            animation_type: AnimationType::Both,
        }
    }

    /// Every change snaps into place on the next frame.
    ///
    /// Events still fire, so listeners observe the same start/complete
    /// sequence as with animated transitions.
    #[must_use]
    pub const fn reduced_motion() -> Self {
        Self {
            layout_transition: Transition::INSTANT,
            style_transition: Transition::INSTANT,
            crossfade_transition: Transition::INSTANT,
            crossfade: false,
            origin: TransformOrigin::TOP_LEFT,
            animation_type: AnimationType::Both,
        }
    }

    /// Options for a newly created node.
    #[must_use]
    pub fn node_options(&self) -> NodeOptions {
        NodeOptions::default()
            .with_origin(self.origin)
            .with_animation_type(self.animation_type)
    }

    /// Box transition for a node with the given options.
    #[must_use]
    pub fn layout_transition_for(&self, options: &NodeOptions) -> Transition {
        options.transition.unwrap_or(self.layout_transition)
    }

    /// Style transition for a node with the given options.
    #[must_use]
    pub fn style_transition_for(&self, options: &NodeOptions) -> Transition {
        options.style_transition.unwrap_or(self.style_transition)
    }

    /// Whether a node with the given options crossfades.
    #[must_use]
    pub fn crossfade_for(&self, options: &NodeOptions) -> bool {
        options.crossfade.unwrap_or(self.crossfade)
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::standard()
    }
}
