// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and box state.

use alloc::vec::Vec;

use kurbo::Vec2;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, NodeId};
use super::options::NodeOptions;
use super::traverse::{Children, Subtree};
use crate::dirty;
use crate::geometry::{BoxDelta, LayoutBox};
use crate::host::InstanceHandle;
use crate::shared::LayoutId;
use crate::style::{NodeStyle, ProjectedStyle};

/// Struct-of-arrays storage for all projection nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct NodeStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Identity and options (set by callers) --
    pub(crate) instance: Vec<InstanceHandle>,
    pub(crate) layout_id: Vec<Option<LayoutId>>,
    pub(crate) options: Vec<NodeOptions>,
    pub(crate) style: Vec<NodeStyle>,

    // -- Boxes --
    pub(crate) measured: Vec<Option<LayoutBox>>,
    pub(crate) snapshot: Vec<Option<LayoutBox>>,
    pub(crate) snapshot_style: Vec<Option<NodeStyle>>,
    pub(crate) target_override: Vec<Option<LayoutBox>>,
    pub(crate) latest: Vec<Option<LayoutBox>>,

    // -- Flags --
    pub(crate) layout_dirty: Vec<bool>,
    pub(crate) needs_measurement: Vec<bool>,
    pub(crate) retarget: Vec<bool>,

    // -- Animated values (written by the controller each frame) --
    pub(crate) current_style: Vec<NodeStyle>,
    pub(crate) opacity: Vec<Option<f64>>,
    pub(crate) follow: Vec<u32>,

    // -- Computed properties (written by project) --
    pub(crate) visual_map: Vec<BoxDelta>,
    pub(crate) tree_scale: Vec<Vec2>,
    pub(crate) projected: Vec<ProjectedStyle>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) rank: Vec<u32>,
    pub(crate) traversal_dirty: bool,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Creates an empty node store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            instance: Vec::new(),
            layout_id: Vec::new(),
            options: Vec::new(),
            style: Vec::new(),
            measured: Vec::new(),
            snapshot: Vec::new(),
            snapshot_style: Vec::new(),
            target_override: Vec::new(),
            latest: Vec::new(),
            layout_dirty: Vec::new(),
            needs_measurement: Vec::new(),
            retarget: Vec::new(),
            current_style: Vec::new(),
            opacity: Vec::new(),
            follow: Vec::new(),
            visual_map: Vec::new(),
            tree_scale: Vec::new(),
            projected: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            rank: Vec::new(),
            traversal_dirty: true,
        }
    }

    // -- Allocation API --

    /// Creates a new node tracking `instance` and returns its handle.
    ///
    /// The node starts unmeasured, with no parent, default options, and no
    /// declared style.
    pub fn create_node(&mut self, instance: InstanceHandle) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.instance[i] = instance;
            self.layout_id[i] = None;
            self.options[i] = NodeOptions::default();
            self.style[i] = NodeStyle::NONE;
            self.measured[i] = None;
            self.snapshot[i] = None;
            self.snapshot_style[i] = None;
            self.target_override[i] = None;
            self.latest[i] = None;
            self.layout_dirty[i] = false;
            self.needs_measurement[i] = true;
            self.retarget[i] = false;
            self.current_style[i] = NodeStyle::NONE;
            self.opacity[i] = None;
            self.follow[i] = INVALID;
            self.visual_map[i] = BoxDelta::IDENTITY;
            self.tree_scale[i] = Vec2::new(1.0, 1.0);
            self.projected[i] = ProjectedStyle::IDENTITY;
            self.rank[i] = INVALID;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.instance.push(instance);
            self.layout_id.push(None);
            self.options.push(NodeOptions::default());
            self.style.push(NodeStyle::NONE);
            self.measured.push(None);
            self.snapshot.push(None);
            self.snapshot_style.push(None);
            self.target_override.push(None);
            self.latest.push(None);
            self.layout_dirty.push(false);
            self.needs_measurement.push(true);
            self.retarget.push(false);
            self.current_style.push(NodeStyle::NONE);
            self.opacity.push(None);
            self.follow.push(INVALID);
            self.visual_map.push(BoxDelta::IDENTITY);
            self.tree_scale.push(Vec2::new(1.0, 1.0));
            self.projected.push(ProjectedStyle::IDENTITY);
            self.generation.push(0);
            self.rank.push(INVALID);
            idx
        };

        self.traversal_dirty = true;
        self.dirty.mark(idx, dirty::TOPOLOGY);

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.layout_id[idx as usize] = None;
        self.follow[idx as usize] = INVALID;

        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// Marks `child`'s subtree for re-projection under the new ancestry.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, or
    /// if `parent` lies inside `child`'s subtree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            !self.is_ancestor_or_self(c, p),
            "cannot add a node beneath its own subtree"
        );

        self.link_last(p, c);
        let _ = self.dirty.add_dependency(c, p, dirty::PROJECTION);

        self.dirty.mark_with(c, dirty::PROJECTION, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "node has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::PROJECTION);

        self.dirty.mark_with(c, dirty::PROJECTION, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `new_parent` lies inside
    /// `child`'s subtree.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        self.validate(child);
        self.validate(new_parent);
        let c = child.idx;
        let p = new_parent.idx;
        assert!(
            !self.is_ancestor_or_self(c, p),
            "cannot add a node beneath its own subtree"
        );

        if self.parent[c as usize] != INVALID {
            let old_p = self.parent[c as usize];
            self.unlink_from_parent(c);
            self.dirty.remove_dependency(c, old_p, dirty::PROJECTION);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }

        self.link_last(p, c);
        let _ = self.dirty.add_dependency(c, p, dirty::PROJECTION);

        self.dirty.mark_with(c, dirty::PROJECTION, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or
    /// `sibling` has no parent.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        assert!(
            !self.is_ancestor_or_self(c, p),
            "cannot add a node beneath its own subtree"
        );

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        let _ = self.dirty.add_dependency(c, p, dirty::PROJECTION);

        self.dirty.mark_with(c, dirty::PROJECTION, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.handle_at(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns a depth-first pre-order iterator over `id` and its
    /// descendants.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Subtree<'_> {
        self.validate(id);
        Subtree::new(self, id.idx)
    }

    /// Returns the root nodes (those with no parent).
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                roots.push(NodeId {
                    idx,
                    generation: self.generation[idx as usize],
                });
            }
        }
        roots
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the host instance tracked by a node.
    #[must_use]
    pub fn instance(&self, id: NodeId) -> InstanceHandle {
        self.validate(id);
        self.instance[id.idx as usize]
    }

    /// Returns the shared layout identity of a node, if registered.
    #[must_use]
    pub fn layout_id(&self, id: NodeId) -> Option<&LayoutId> {
        self.validate(id);
        self.layout_id[id.idx as usize].as_ref()
    }

    /// Returns the options of a node.
    #[must_use]
    pub fn options(&self, id: NodeId) -> NodeOptions {
        self.validate(id);
        self.options[id.idx as usize]
    }

    /// Returns the declared style of a node.
    #[must_use]
    pub fn style(&self, id: NodeId) -> NodeStyle {
        self.validate(id);
        self.style[id.idx as usize]
    }

    /// Returns the style currently shown (declared or mid-animation), before
    /// scale correction.
    #[must_use]
    pub fn current_style(&self, id: NodeId) -> NodeStyle {
        self.validate(id);
        self.current_style[id.idx as usize]
    }

    /// Returns the last measured layout box, if the node has been measured.
    #[must_use]
    pub fn measured_box(&self, id: NodeId) -> Option<LayoutBox> {
        self.validate(id);
        self.measured[id.idx as usize]
    }

    /// Returns the pre-mutation box captured by the last `will_update`.
    #[must_use]
    pub fn snapshot_box(&self, id: NodeId) -> Option<LayoutBox> {
        self.validate(id);
        self.snapshot[id.idx as usize]
    }

    /// Returns the box the node converges to: the explicit target if one is
    /// set, else the measured box.
    #[must_use]
    pub fn target_box(&self, id: NodeId) -> Option<LayoutBox> {
        self.validate(id);
        self.target_at(id.idx)
    }

    /// Returns the box the node currently occupies on screen.
    #[must_use]
    pub fn latest_box(&self, id: NodeId) -> Option<LayoutBox> {
        self.validate(id);
        self.latest[id.idx as usize]
    }

    /// Returns whether the node was snapshotted and awaits its delta.
    #[must_use]
    pub fn is_layout_dirty(&self, id: NodeId) -> bool {
        self.validate(id);
        self.layout_dirty[id.idx as usize]
    }

    /// Returns whether the node awaits a read.
    #[must_use]
    pub fn needs_measurement(&self, id: NodeId) -> bool {
        self.validate(id);
        self.needs_measurement[id.idx as usize]
    }

    /// Returns the crossfade opacity override, if any.
    #[must_use]
    pub fn opacity(&self, id: NodeId) -> Option<f64> {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns the combined visual scale of the node (`latest / measured`).
    ///
    /// Only valid after a projection pass.
    #[must_use]
    pub fn tree_scale(&self, id: NodeId) -> Vec2 {
        self.validate(id);
        self.tree_scale[id.idx as usize]
    }

    /// Returns the style last produced for the node by a projection pass.
    #[must_use]
    pub fn projected_style(&self, id: NodeId) -> ProjectedStyle {
        self.validate(id);
        self.projected[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the options of a node.
    ///
    /// Marks the node for re-projection since the origin may have changed.
    pub fn set_options(&mut self, id: NodeId, options: NodeOptions) {
        self.validate(id);
        self.options[id.idx as usize] = options;
        self.dirty
            .mark_with(id.idx, dirty::PROJECTION, &EagerPolicy);
    }

    /// Sets the declared style of a node.
    ///
    /// The change shows immediately; call
    /// [`will_update`](crate::controller::LayoutProjection::will_update)
    /// first to animate it.
    pub fn set_style(&mut self, id: NodeId, style: NodeStyle) {
        self.validate(id);
        self.style[id.idx as usize] = style;
        self.set_current_style_at(id.idx, style);
    }

    // -- Raw-index accessors --
    //
    // These accept raw slot indices (as found in `ProjectionChanges` or the
    // traversal order) rather than `NodeId` handles, skipping generation
    // validation.

    /// Returns the host instance at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn instance_at(&self, idx: u32) -> InstanceHandle {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.instance[idx as usize]
    }

    /// Returns the projected style at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn projected_at(&self, idx: u32) -> &ProjectedStyle {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        &self.projected[idx as usize]
    }

    // -- Crate-internal helpers used by the scheduler and controller --

    /// Returns the live handle for a raw slot, or `None` for [`INVALID`] or
    /// freed slots.
    pub(crate) fn handle_at(&self, idx: u32) -> Option<NodeId> {
        if idx == INVALID || idx >= self.len || self.free_list.contains(&idx) {
            None
        } else {
            Some(NodeId {
                idx,
                generation: self.generation[idx as usize],
            })
        }
    }

    pub(crate) fn target_at(&self, idx: u32) -> Option<LayoutBox> {
        let i = idx as usize;
        self.target_override[i].or(self.measured[i])
    }

    /// The box the node currently shows, falling back to its target.
    pub(crate) fn visual_box_at(&self, idx: u32) -> Option<LayoutBox> {
        self.latest[idx as usize].or_else(|| self.target_at(idx))
    }

    /// Records a successful read.
    pub(crate) fn set_measured_at(&mut self, idx: u32, measured: LayoutBox) {
        let i = idx as usize;
        self.measured[i] = Some(measured);
        self.needs_measurement[i] = false;
        self.dirty.mark_with(idx, dirty::PROJECTION, &EagerPolicy);
    }

    /// Records a failed read: the node is dropped from this update.
    pub(crate) fn clear_pending_layout_at(&mut self, idx: u32) {
        let i = idx as usize;
        self.layout_dirty[i] = false;
        self.retarget[i] = false;
        self.snapshot[i] = None;
        self.snapshot_style[i] = None;
    }

    pub(crate) fn set_latest_at(&mut self, idx: u32, latest: Option<LayoutBox>) {
        if self.latest[idx as usize] != latest {
            self.latest[idx as usize] = latest;
            self.dirty.mark_with(idx, dirty::PROJECTION, &EagerPolicy);
        }
    }

    pub(crate) fn set_current_style_at(&mut self, idx: u32, style: NodeStyle) {
        if self.current_style[idx as usize] != style {
            self.current_style[idx as usize] = style;
            self.dirty.mark(idx, dirty::STYLE);
        }
    }

    pub(crate) fn set_opacity_at(&mut self, idx: u32, opacity: Option<f64>) {
        if self.opacity[idx as usize] != opacity {
            self.opacity[idx as usize] = opacity;
            self.dirty.mark(idx, dirty::STYLE);
        }
    }

    /// Snapshots the node's visual box and style and flags it for a read.
    pub(crate) fn snapshot_at(&mut self, idx: u32) {
        let i = idx as usize;
        self.snapshot[i] = self.visual_box_at(idx);
        self.snapshot_style[i] = Some(self.current_style[i]);
        self.layout_dirty[i] = true;
        self.needs_measurement[i] = true;
        self.dirty.mark(idx, dirty::LAYOUT);
    }

    /// Makes `source` the box (and style) a layout animation starts from,
    /// as if the node had been snapshotted there.
    pub(crate) fn set_snapshot_at(
        &mut self,
        idx: u32,
        source: LayoutBox,
        style: Option<NodeStyle>,
    ) {
        let i = idx as usize;
        self.snapshot[i] = Some(source);
        self.snapshot_style[i] = style;
        self.layout_dirty[i] = true;
    }

    /// Clears the layout-dirty flag and returns the snapshot.
    pub(crate) fn take_snapshot_at(&mut self, idx: u32) -> (Option<LayoutBox>, Option<NodeStyle>) {
        let i = idx as usize;
        self.layout_dirty[i] = false;
        (self.snapshot[i].take(), self.snapshot_style[i].take())
    }

    /// Sets or clears the explicit target and flags the node for retargeting.
    pub(crate) fn set_target_override_at(&mut self, idx: u32, target: Option<LayoutBox>) {
        let i = idx as usize;
        self.target_override[i] = target;
        self.retarget[i] = true;
        self.dirty.mark_with(idx, dirty::PROJECTION, &EagerPolicy);
    }

    /// Clears the retarget flag, returning whether it was set.
    pub(crate) fn take_retarget_at(&mut self, idx: u32) -> bool {
        core::mem::take(&mut self.retarget[idx as usize])
    }

    pub(crate) fn mark_needs_measurement_at(&mut self, idx: u32) {
        self.needs_measurement[idx as usize] = true;
    }

    pub(crate) fn set_layout_id_at(&mut self, idx: u32, layout_id: Option<LayoutId>) {
        self.layout_id[idx as usize] = layout_id;
    }

    /// Makes the node at `idx` track the latest box of `lead`
    /// ([`INVALID`] to stop).
    pub(crate) fn set_follow_at(&mut self, idx: u32, lead: u32) {
        self.follow[idx as usize] = lead;
    }

    pub(crate) fn follow_at(&self, idx: u32) -> u32 {
        self.follow[idx as usize]
    }

    /// Raw indices of live nodes tracking `lead`.
    pub(crate) fn followers_of(&self, lead: u32) -> Vec<u32> {
        (0..self.len)
            .filter(|&i| self.follow[i as usize] == lead && !self.free_list.contains(&i))
            .collect()
    }

    /// Drains the nodes snapshotted since the last call.
    pub(crate) fn drain_layout(&mut self) -> Vec<u32> {
        self.dirty
            .drain(dirty::LAYOUT)
            .deterministic()
            .run()
            .collect()
    }

    /// Rebuilds the traversal order if topology changed. Returns whether a
    /// rebuild happened.
    pub(crate) fn refresh_traversal(&mut self) -> bool {
        if !self.traversal_dirty {
            return false;
        }
        self.traversal_order.clear();
        self.rank.fill(INVALID);
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                self.dfs_collect(idx);
            }
        }
        for (rank, &idx) in self.traversal_order.iter().enumerate() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "slot counts are bounded by u32 indices"
            )]
            let rank = rank as u32;
            self.rank[idx as usize] = rank;
        }
        self.traversal_dirty = false;
        true
    }

    /// Returns the depth-first pre-order position of a raw slot.
    pub(crate) fn rank_at(&self, idx: u32) -> u32 {
        self.rank[idx as usize]
    }

    /// Returns the current traversal order (depth-first pre-order).
    ///
    /// Only valid after a frame or projection pass has run since the last
    /// topology change.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Whether `ancestor` is `idx` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: u32, idx: u32) -> bool {
        let mut cur = idx;
        while cur != INVALID {
            if cur == ancestor {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    /// Appends `c` to the end of `p`'s child list.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Depth-first pre-order collection starting from `idx`.
    fn dfs_collect(&mut self, idx: u32) {
        self.traversal_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn store_with(n: u64) -> (NodeStore, Vec<NodeId>) {
        let mut store = NodeStore::new();
        let ids = (0..n)
            .map(|i| store.create_node(InstanceHandle(i)))
            .collect();
        (store, ids)
    }

    #[test]
    fn create_and_destroy() {
        let (mut store, ids) = store_with(1);
        assert!(store.is_alive(ids[0]));
        assert_eq!(store.node_count(), 1);
        store.destroy_node(ids[0]);
        assert!(!store.is_alive(ids[0]));
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = NodeStore::new();
        let id1 = store.create_node(InstanceHandle(1));
        store.destroy_node(id1);
        let id2 = store.create_node(InstanceHandle(2));
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
        assert_eq!(store.instance(id2), InstanceHandle(2));
        assert!(store.needs_measurement(id2));
    }

    #[test]
    fn add_child_and_query() {
        let (mut store, ids) = store_with(3);
        store.add_child(ids[0], ids[1]);
        store.add_child(ids[0], ids[2]);

        assert_eq!(store.parent(ids[1]), Some(ids[0]));
        let kids: Vec<_> = store.children(ids[0]).collect();
        assert_eq!(kids, vec![ids[1], ids[2]]);
        assert_eq!(store.roots(), vec![ids[0]]);
    }

    #[test]
    fn insert_before_orders_siblings() {
        let (mut store, ids) = store_with(4);
        store.add_child(ids[0], ids[1]);
        store.add_child(ids[0], ids[2]);
        store.insert_before(ids[3], ids[2]);
        let kids: Vec<_> = store.children(ids[0]).collect();
        assert_eq!(kids, vec![ids[1], ids[3], ids[2]]);
    }

    #[test]
    fn reparent_moves_subtree() {
        let (mut store, ids) = store_with(4);
        store.add_child(ids[0], ids[1]);
        store.add_child(ids[1], ids[2]);
        store.reparent(ids[1], ids[3]);
        assert_eq!(store.parent(ids[1]), Some(ids[3]));
        assert_eq!(store.children(ids[0]).count(), 0);
        let sub: Vec<_> = store.subtree(ids[3]).collect();
        assert_eq!(sub, vec![ids[3], ids[1], ids[2]]);
    }

    #[test]
    fn traversal_ranks_follow_depth_first_order() {
        let (mut store, ids) = store_with(4);
        // Tree: a -> [b -> [d], c]
        store.add_child(ids[0], ids[1]);
        store.add_child(ids[0], ids[2]);
        store.add_child(ids[1], ids[3]);
        assert!(store.refresh_traversal());
        assert!(!store.refresh_traversal());
        assert_eq!(
            store.traversal_order(),
            &[ids[0].idx, ids[1].idx, ids[3].idx, ids[2].idx]
        );
        assert_eq!(store.rank_at(ids[3].idx), 2);
    }

    #[test]
    fn snapshot_uses_latest_box() {
        let (mut store, ids) = store_with(1);
        let idx = ids[0].idx;
        store.set_measured_at(idx, LayoutBox::new(0.0, 0.0, 10.0, 10.0));
        store.set_latest_at(idx, Some(LayoutBox::new(5.0, 5.0, 15.0, 15.0)));
        store.snapshot_at(idx);
        assert_eq!(
            store.snapshot_box(ids[0]),
            Some(LayoutBox::new(5.0, 5.0, 15.0, 15.0))
        );
        assert!(store.is_layout_dirty(ids[0]));
        assert_eq!(store.drain_layout(), vec![idx]);
        assert!(store.drain_layout().is_empty());
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let (mut store, ids) = store_with(2);
        store.add_child(ids[0], ids[1]);
        store.destroy_node(ids[0]);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_handle_panics() {
        let (mut store, ids) = store_with(1);
        store.destroy_node(ids[0]);
        let _ = store.measured_box(ids[0]);
    }

    #[test]
    #[should_panic(expected = "cannot add a node beneath its own subtree")]
    fn reparent_into_own_subtree_panics() {
        let (mut store, ids) = store_with(2);
        store.add_child(ids[0], ids[1]);
        store.reparent(ids[0], ids[1]);
    }
}
