// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared layout identity.
//!
//! Nodes registered under the same [`LayoutId`] are presented as one element
//! that morphs across mounts: when a new node takes over an identity, it
//! animates from the box the previous holder last occupied, and the two
//! crossfade.
//!
//! Each identity owns a group with at most one *lead* (the node currently
//! representing it) and, while a crossfade runs, one *previous lead*:
//!
//! ```text
//! Empty ──register──▶ SingleLead ──register──▶ Transitioning(lead, prev)
//!   ▲                     ▲                              │
//!   └──last deregister────┴──────crossfade complete──────┘
//! ```
//!
//! Registrations are resolved once per frame, after the read phase. When
//! several nodes register under one identity in the same frame, the one
//! last in depth-first traversal order wins.
//!
//! Removing the lead promotes the most recently registered remaining
//! member. A group left without members keeps the last lead's box for one
//! more frame, so a node mounted in the same batch as the old one unmounts
//! still animates from it; after that the group is discarded.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::geometry::LayoutBox;
use crate::node::{NodeId, NodeStore};
use crate::style::NodeStyle;

/// A shared layout identity.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayoutId(String);

impl LayoutId {
    /// The identity as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayoutId {
    fn from(s: &str) -> Self {
        Self(String::from(s))
    }
}

impl From<String> for LayoutId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayoutId({:?})", self.0)
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a shared identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupState {
    /// No lead.
    Empty,
    /// One node represents the identity.
    SingleLead(NodeId),
    /// A new lead is crossfading in over the previous one.
    Transitioning {
        /// The node fading in.
        lead: NodeId,
        /// The node fading out.
        previous: NodeId,
    },
}

/// A committed lead change, waiting to be turned into animations.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Handoff {
    pub(crate) layout_id: LayoutId,
    pub(crate) lead: NodeId,
    /// The outgoing lead, if it is still mounted and should crossfade out.
    pub(crate) previous: Option<NodeId>,
    /// Where the identity was last seen.
    pub(crate) source_box: Option<LayoutBox>,
    pub(crate) source_style: Option<NodeStyle>,
}

#[derive(Debug, Default)]
struct Group {
    /// Registration order; the last entry is the most recent.
    members: Vec<NodeId>,
    lead: Option<NodeId>,
    prev_lead: Option<NodeId>,
    /// Registered since the last resolution.
    pending: Vec<NodeId>,
    last_lead_box: Option<LayoutBox>,
    last_lead_style: Option<NodeStyle>,
    /// Lead promoted by a deregistration, not yet resolved.
    promoted: Option<Handoff>,
    /// Set at the end of a frame that found the group empty.
    stale: bool,
}

/// All shared-layout groups, keyed by identity.
#[derive(Debug, Default)]
pub struct SharedLayoutRegistry {
    groups: BTreeMap<LayoutId, Group>,
}

impl SharedLayoutRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed lead of `id`.
    ///
    /// Registrations made since the last frame are not reflected until that
    /// frame resolves them.
    #[must_use]
    pub fn resolve_lead(&self, id: &LayoutId) -> Option<NodeId> {
        self.groups.get(id).and_then(|g| g.lead)
    }

    /// The previous lead while a crossfade runs.
    #[must_use]
    pub fn previous_lead(&self, id: &LayoutId) -> Option<NodeId> {
        self.groups.get(id).and_then(|g| g.prev_lead)
    }

    /// Lifecycle state of `id`.
    #[must_use]
    pub fn state(&self, id: &LayoutId) -> GroupState {
        match self.groups.get(id) {
            Some(Group {
                lead: Some(lead),
                prev_lead: Some(previous),
                ..
            }) => GroupState::Transitioning {
                lead: *lead,
                previous: *previous,
            },
            Some(Group {
                lead: Some(lead), ..
            }) => GroupState::SingleLead(*lead),
            _ => GroupState::Empty,
        }
    }

    /// Members of `id`, oldest registration first.
    #[must_use]
    pub fn members(&self, id: &LayoutId) -> &[NodeId] {
        self.groups.get(id).map_or(&[], |g| &g.members)
    }

    /// Number of groups, including empty ones kept for one more frame.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Adds `node` to `id`. Takes effect when the next frame resolves.
    pub(crate) fn register(&mut self, id: LayoutId, node: NodeId) {
        let group = self.groups.entry(id).or_default();
        if !group.members.contains(&node) {
            group.members.push(node);
        }
        group.pending.push(node);
        group.stale = false;
    }

    /// Removes `node` from `id`, promoting another member if it was the
    /// lead. `node` must still be alive in `store`.
    pub(crate) fn deregister(&mut self, id: &LayoutId, node: NodeId, store: &NodeStore) {
        let Some(group) = self.groups.get_mut(id) else {
            return;
        };
        group.members.retain(|&m| m != node);
        group.pending.retain(|&m| m != node);
        if group.prev_lead == Some(node) {
            group.prev_lead = None;
        }
        if group.promoted.as_ref().is_some_and(|h| h.lead == node) {
            group.promoted = None;
        }
        if group.lead == Some(node) {
            group.last_lead_box = store.visual_box_at(node.idx);
            group.last_lead_style = Some(store.current_style[node.idx as usize]);
            group.lead = None;
            group.prev_lead = None;
            if let Some(&next) = group.members.last() {
                group.lead = Some(next);
                group.promoted = Some(Handoff {
                    layout_id: id.clone(),
                    lead: next,
                    previous: None,
                    source_box: group.last_lead_box,
                    source_style: group.last_lead_style,
                });
            }
        }
        group.stale = false;
    }

    /// Commits pending registrations and promotions.
    ///
    /// Must run after the read phase, so new leads have a measured box.
    pub(crate) fn resolve(&mut self, store: &NodeStore) -> Vec<Handoff> {
        let mut handoffs = Vec::new();
        for (id, group) in &mut self.groups {
            let candidates: Vec<NodeId> = group
                .pending
                .drain(..)
                .filter(|&n| store.is_alive(n))
                .collect();
            let winner = candidates
                .iter()
                .copied()
                .max_by_key(|n| store.rank_at(n.idx));
            // A winner that has never been measured cannot animate in yet;
            // it is committed by the first frame that reads it.
            let winner = match winner {
                Some(w) if store.target_at(w.idx).is_none() => {
                    group.pending = candidates;
                    None
                }
                w => w,
            };
            let promoted = group.promoted.take();

            match winner {
                Some(winner) if group.lead != Some(winner) => {
                    // A lead promoted this frame never showed; fade in from
                    // the departed lead instead.
                    let outgoing = group
                        .lead
                        .filter(|&l| store.is_alive(l) && promoted.is_none());
                    let (source_box, source_style) = match outgoing {
                        Some(l) => (
                            store.visual_box_at(l.idx),
                            Some(store.current_style[l.idx as usize]),
                        ),
                        None => (group.last_lead_box, group.last_lead_style),
                    };
                    group.lead = Some(winner);
                    group.prev_lead = outgoing;
                    handoffs.push(Handoff {
                        layout_id: id.clone(),
                        lead: winner,
                        previous: outgoing,
                        source_box,
                        source_style,
                    });
                }
                _ => handoffs.extend(promoted),
            }
        }
        handoffs
    }

    /// Releases the previous lead of `id`. Returns `(lead, previous)` if a
    /// crossfade was running.
    pub(crate) fn complete_crossfade(&mut self, id: &LayoutId) -> Option<(NodeId, NodeId)> {
        let group = self.groups.get_mut(id)?;
        let previous = group.prev_lead.take()?;
        Some((group.lead?, previous))
    }

    /// Remembers where every lead is, for groups that lose all members.
    pub(crate) fn record_lead_boxes(&mut self, store: &NodeStore) {
        for group in self.groups.values_mut() {
            if let Some(lead) = group.lead.filter(|&l| store.is_alive(l)) {
                if let Some(b) = store.visual_box_at(lead.idx) {
                    group.last_lead_box = Some(b);
                    group.last_lead_style = Some(store.current_style[lead.idx as usize]);
                }
            }
        }
    }

    /// Discards groups that have been empty for a whole frame.
    pub(crate) fn end_frame(&mut self) {
        self.groups.retain(|_, g| {
            if !g.members.is_empty() {
                return true;
            }
            let keep = !g.stale;
            g.stale = true;
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::host::InstanceHandle;

    fn measured_store(boxes: &[LayoutBox]) -> (NodeStore, Vec<NodeId>) {
        let mut store = NodeStore::new();
        let ids: Vec<NodeId> = boxes
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let id = store.create_node(InstanceHandle(i as u64));
                store.set_measured_at(id.idx, *b);
                id
            })
            .collect();
        store.refresh_traversal();
        (store, ids)
    }

    fn card() -> LayoutId {
        LayoutId::from("card")
    }

    #[test]
    fn first_registration_becomes_lead() {
        let (store, ids) = measured_store(&[LayoutBox::new(0.0, 0.0, 10.0, 10.0)]);
        let mut reg = SharedLayoutRegistry::new();
        reg.register(card(), ids[0]);
        assert_eq!(reg.state(&card()), GroupState::Empty);
        let handoffs = reg.resolve(&store);
        assert_eq!(handoffs.len(), 1);
        assert_eq!(handoffs[0].source_box, None);
        assert_eq!(reg.state(&card()), GroupState::SingleLead(ids[0]));
        assert!(reg.resolve(&store).is_empty());
    }

    #[test]
    fn new_registration_transitions_from_old_lead() {
        let a_box = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let (store, ids) = measured_store(&[a_box, LayoutBox::new(50.0, 50.0, 250.0, 150.0)]);
        let mut reg = SharedLayoutRegistry::new();
        reg.register(card(), ids[0]);
        let _ = reg.resolve(&store);
        reg.register(card(), ids[1]);
        let handoffs = reg.resolve(&store);
        assert_eq!(handoffs[0].lead, ids[1]);
        assert_eq!(handoffs[0].previous, Some(ids[0]));
        assert_eq!(handoffs[0].source_box, Some(a_box));
        assert_eq!(
            reg.state(&card()),
            GroupState::Transitioning {
                lead: ids[1],
                previous: ids[0]
            }
        );
        assert_eq!(reg.complete_crossfade(&card()), Some((ids[1], ids[0])));
        assert_eq!(reg.state(&card()), GroupState::SingleLead(ids[1]));
    }

    #[test]
    fn unmeasured_registration_waits_for_its_first_read() {
        let a_box = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let (mut store, mut ids) = measured_store(&[a_box]);
        ids.push(store.create_node(InstanceHandle(1)));
        store.refresh_traversal();
        let mut reg = SharedLayoutRegistry::new();
        reg.register(card(), ids[0]);
        let _ = reg.resolve(&store);

        reg.register(card(), ids[1]);
        assert!(reg.resolve(&store).is_empty());
        assert_eq!(reg.state(&card()), GroupState::SingleLead(ids[0]));

        store.set_measured_at(ids[1].idx, LayoutBox::new(50.0, 50.0, 250.0, 150.0));
        let handoffs = reg.resolve(&store);
        assert_eq!(handoffs.len(), 1);
        assert_eq!(handoffs[0].lead, ids[1]);
        assert_eq!(handoffs[0].previous, Some(ids[0]));
        assert_eq!(handoffs[0].source_box, Some(a_box));
    }

    #[test]
    fn same_frame_registrations_resolve_to_last_in_traversal() {
        let b = LayoutBox::new(0.0, 0.0, 10.0, 10.0);
        let (store, ids) = measured_store(&[b, b, b]);
        let mut reg = SharedLayoutRegistry::new();
        reg.register(card(), ids[2]);
        reg.register(card(), ids[0]);
        reg.register(card(), ids[1]);
        let _ = reg.resolve(&store);
        assert_eq!(reg.resolve_lead(&card()), Some(ids[2]));
    }

    #[test]
    fn removing_lead_promotes_most_recent_member() {
        let a_box = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let (store, ids) = measured_store(&[a_box, a_box, a_box]);
        let mut reg = SharedLayoutRegistry::new();
        reg.register(card(), ids[0]);
        reg.register(card(), ids[1]);
        let _ = reg.resolve(&store);
        reg.register(card(), ids[2]);
        let _ = reg.resolve(&store);
        assert_eq!(reg.resolve_lead(&card()), Some(ids[2]));

        reg.deregister(&card(), ids[2], &store);
        assert_eq!(reg.resolve_lead(&card()), Some(ids[1]));
        let handoffs = reg.resolve(&store);
        assert_eq!(handoffs[0].lead, ids[1]);
        assert_eq!(handoffs[0].previous, None);
        assert_eq!(handoffs[0].source_box, Some(a_box));
        assert_eq!(reg.members(&card()), &[ids[0], ids[1]]);
    }

    #[test]
    fn unmount_then_mount_in_one_batch_uses_departed_box() {
        let a_box = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let b_box = LayoutBox::new(50.0, 50.0, 250.0, 150.0);
        let (store, ids) = measured_store(&[a_box, b_box]);
        let mut reg = SharedLayoutRegistry::new();
        reg.register(card(), ids[0]);
        let _ = reg.resolve(&store);

        reg.deregister(&card(), ids[0], &store);
        assert_eq!(reg.state(&card()), GroupState::Empty);
        reg.register(card(), ids[1]);
        let handoffs = reg.resolve(&store);
        assert_eq!(handoffs.len(), 1);
        assert_eq!(handoffs[0].lead, ids[1]);
        assert_eq!(handoffs[0].previous, None);
        assert_eq!(handoffs[0].source_box, Some(a_box));
    }

    #[test]
    fn empty_group_discarded_after_one_frame() {
        let (store, ids) = measured_store(&[LayoutBox::new(0.0, 0.0, 10.0, 10.0)]);
        let mut reg = SharedLayoutRegistry::new();
        reg.register(card(), ids[0]);
        let _ = reg.resolve(&store);
        reg.deregister(&card(), ids[0], &store);
        reg.end_frame();
        assert_eq!(reg.group_count(), 1);
        reg.end_frame();
        assert_eq!(reg.group_count(), 0);
        assert_eq!(reg.members(&card()), &[] as &[NodeId]);
    }

    #[test]
    fn removing_previous_lead_ends_transition() {
        let b = LayoutBox::new(0.0, 0.0, 10.0, 10.0);
        let (store, ids) = measured_store(&[b, b]);
        let mut reg = SharedLayoutRegistry::new();
        reg.register(card(), ids[0]);
        let _ = reg.resolve(&store);
        reg.register(card(), ids[1]);
        let _ = reg.resolve(&store);
        reg.deregister(&card(), ids[0], &store);
        assert_eq!(reg.state(&card()), GroupState::SingleLead(ids[1]));
        assert_eq!(reg.complete_crossfade(&card()), None);
        assert_eq!(reg.members(&card()), vec![ids[1]].as_slice());
    }
}
