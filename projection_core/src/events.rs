// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle notifications for layout animations.
//!
//! Listeners subscribe per node and per [`EventKind`]. Events raised during a
//! frame are queued and dispatched once the frame's flush has finished, in
//! the order they were raised. Listeners cannot touch the controller
//! directly; instead they receive a [`FrameRequests`] through which they can
//! ask for `will_update`, `did_update`, or a forced re-measure. Those
//! requests are applied right after dispatch, so any reads they cause happen
//! in the next frame.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::animation::AnimationHandle;
use crate::node::NodeId;
use crate::shared::LayoutId;

/// Why an animation stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompletionReason {
    /// Every property group reached its target.
    Completed,
    /// A newer animation, `will_update`, a cancel, or node destruction cut it
    /// short.
    Interrupted,
}

/// A lifecycle notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutEvent {
    /// An animation took its first sample.
    AnimationStart {
        /// The animation.
        handle: AnimationHandle,
    },
    /// An animation stopped.
    AnimationComplete {
        /// The animation.
        handle: AnimationHandle,
        /// Whether it finished or was cut short.
        reason: CompletionReason,
    },
    /// A shared-identity crossfade finished and the previous lead was
    /// released.
    CrossfadeComplete {
        /// The identity of the group.
        layout_id: LayoutId,
        /// The lead that faded in.
        lead: NodeId,
        /// The previous lead that faded out.
        previous: NodeId,
    },
}

impl LayoutEvent {
    /// The node the event is about. For crossfades, the lead.
    #[must_use]
    pub fn node(&self) -> NodeId {
        match self {
            Self::AnimationStart { handle } | Self::AnimationComplete { handle, .. } => {
                handle.node()
            }
            Self::CrossfadeComplete { lead, .. } => *lead,
        }
    }

    /// The kind of the event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AnimationStart { .. } => EventKind::AnimationStart,
            Self::AnimationComplete { .. } => EventKind::AnimationComplete,
            Self::CrossfadeComplete { .. } => EventKind::CrossfadeComplete,
        }
    }

    /// Whether a listener on `node` should see the event.
    ///
    /// Crossfade completions reach both the lead and the previous lead.
    #[must_use]
    pub fn involves(&self, node: NodeId) -> bool {
        match self {
            Self::CrossfadeComplete { lead, previous, .. } => *lead == node || *previous == node,
            _ => self.node() == node,
        }
    }
}

/// Discriminant of a [`LayoutEvent`], used to subscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`LayoutEvent::AnimationStart`].
    AnimationStart,
    /// [`LayoutEvent::AnimationComplete`].
    AnimationComplete,
    /// [`LayoutEvent::CrossfadeComplete`].
    CrossfadeComplete,
}

/// Identifies one subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// A subscribed callback.
pub type Listener = Box<dyn FnMut(&LayoutEvent, &mut FrameRequests)>;

/// Work a listener asks the controller to do after dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameRequests {
    pub(crate) will_update: Vec<NodeId>,
    pub(crate) did_update: bool,
    pub(crate) force_remeasure: Vec<NodeId>,
}

impl FrameRequests {
    /// Requests a snapshot of `node`'s subtree.
    pub fn will_update(&mut self, node: NodeId) {
        self.will_update.push(node);
    }

    /// Requests that snapshotted nodes be scheduled for a read.
    pub fn did_update(&mut self) {
        self.did_update = true;
    }

    /// Requests a re-measure of `node`'s subtree without animating.
    pub fn force_remeasure(&mut self, node: NodeId) {
        self.force_remeasure.push(node);
    }

    /// Whether nothing was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.will_update.is_empty() && !self.did_update && self.force_remeasure.is_empty()
    }
}

struct Subscription {
    id: SubscriptionId,
    node: NodeId,
    kind: EventKind,
    listener: Listener,
}

/// Queues events and delivers them to subscribed listeners.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    queue: Vec<LayoutEvent>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind` about `node`.
    pub fn subscribe(&mut self, node: NodeId, kind: EventKind, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            node,
            kind,
            listener,
        });
        id
    }

    /// Removes a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Removes every subscription on `node`.
    pub fn remove_node(&mut self, node: NodeId) {
        self.subscriptions.retain(|s| s.node != node);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Queues `event` for the next dispatch.
    pub fn emit(&mut self, event: LayoutEvent) {
        self.queue.push(event);
    }

    /// Events waiting for dispatch.
    #[must_use]
    pub fn pending(&self) -> &[LayoutEvent] {
        &self.queue
    }

    /// Delivers every queued event, in order. Returns the number of
    /// listener invocations.
    pub fn dispatch(&mut self, requests: &mut FrameRequests) -> usize {
        let events = core::mem::take(&mut self.queue);
        let mut calls = 0;
        for event in &events {
            let kind = event.kind();
            for sub in &mut self.subscriptions {
                if sub.kind == kind && event.involves(sub.node) {
                    (sub.listener)(event, requests);
                    calls += 1;
                }
            }
        }
        calls
    }
}
