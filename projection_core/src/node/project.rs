// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Top-down projection pass with ancestor scale correction.
//!
//! Projection follows a drain-recompute pattern:
//!
//! 1. **PROJECTION** and **STYLE** are drained and merged, then sorted by
//!    traversal rank so every parent is processed before its children.
//! 2. For each node, its measured box is pushed through the parent's
//!    visual map (`parent.measured → parent.latest`), giving the box the
//!    node would visually occupy with no transform of its own. The render
//!    delta maps that corrected box onto the node's latest box.
//! 3. The delta's translation is divided by the parent's visual scale, since
//!    ancestor transforms stretch the node's local space; its scale is the
//!    residual the node needs beyond what its ancestors already impose.
//! 4. Border radius and box shadow are divided by the node's own combined
//!    visual scale (`latest / measured`).
//!
//! Only nodes whose resulting [`ProjectedStyle`] differs from the previous
//! pass are reported in [`ProjectionChanges::styles`], so a pass over an
//! unchanged tree reports nothing to write.

use alloc::vec::Vec;

use kurbo::Vec2;

use super::id::INVALID;
use super::store::NodeStore;
use crate::dirty;
use crate::geometry::{BoxDelta, TransformOrigin};
use crate::style::ProjectedStyle;
use crate::transform::ProjectionTransform;

/// The set of changes produced by a single [`NodeStore::project`] call.
///
/// Fields hold raw slot indices, in traversal order.
#[derive(Clone, Debug, Default)]
pub struct ProjectionChanges {
    /// Nodes whose projection was recomputed.
    pub recomputed: Vec<u32>,
    /// Nodes whose projected style changed and must be written.
    pub styles: Vec<u32>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
}

impl ProjectionChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.recomputed.clear();
        self.styles.clear();
        self.topology_changed = false;
    }
}

impl NodeStore {
    /// Runs the projection pass and returns the set of changes.
    pub fn project(&mut self) -> ProjectionChanges {
        let mut changes = ProjectionChanges::default();
        self.project_into(&mut changes);
        changes
    }

    /// Like [`project`](Self::project), but reuses a caller-provided buffer.
    pub fn project_into(&mut self, changes: &mut ProjectionChanges) {
        changes.clear();

        if self.refresh_traversal() {
            changes.topology_changed = true;
        }

        let mut work: Vec<u32> = self
            .dirty
            .drain(dirty::PROJECTION)
            .affected()
            .deterministic()
            .run()
            .collect();
        work.extend(self.dirty.drain(dirty::STYLE).deterministic().run());
        work.retain(|&idx| self.rank[idx as usize] != INVALID);
        work.sort_unstable_by_key(|&idx| self.rank[idx as usize]);
        work.dedup();

        for &idx in &work {
            if self.project_node(idx) {
                changes.styles.push(idx);
            }
        }
        changes.recomputed = work;

        // Topology changes are structural; the rebuild above consumed them.
        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
    }

    /// Recomputes one node. Returns whether its projected style changed.
    fn project_node(&mut self, idx: u32) -> bool {
        let i = idx as usize;
        let projected = if let Some(measured) = self.measured[i] {
            let latest = self.latest[i].unwrap_or(measured);
            let parent = self.parent[i];
            let parent_map = if parent != INVALID && self.measured[parent as usize].is_some() {
                self.visual_map[parent as usize]
            } else {
                BoxDelta::IDENTITY
            };

            let corrected = parent_map.apply(measured);
            let delta = BoxDelta::between(corrected, latest, self.options[i].origin);
            let transform = ProjectionTransform::from_delta(&delta, parent_map.scale());

            let visual_map = BoxDelta::between(measured, latest, TransformOrigin::TOP_LEFT);
            let tree_scale = visual_map.scale();
            self.visual_map[i] = visual_map;
            self.tree_scale[i] = tree_scale;

            let style = self.current_style[i].corrected(tree_scale);
            ProjectedStyle {
                transform,
                opacity: self.opacity[i],
                border_radius: style.border_radius,
                box_shadow: style.box_shadow,
            }
        } else {
            self.visual_map[i] = BoxDelta::IDENTITY;
            self.tree_scale[i] = Vec2::new(1.0, 1.0);
            ProjectedStyle {
                opacity: self.opacity[i],
                ..ProjectedStyle::IDENTITY
            }
        };

        if self.projected[i] == projected {
            false
        } else {
            self.projected[i] = projected;
            true
        }
    }
}
