// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The top-level layout projection controller.
//!
//! [`LayoutProjection`] owns every piece of engine state: the node store,
//! the measurement scheduler, the animation driver, the shared-identity
//! registry, and the event bus. Embedders interact with it in two ways:
//!
//! - **Between frames**, bracket every layout mutation with
//!   [`will_update`](LayoutProjection::will_update) (before) and
//!   [`did_update`](LayoutProjection::did_update) (after). Nothing touches
//!   the host here; the calls only snapshot boxes and queue reads.
//! - **Once per frame**, call [`frame`](LayoutProjection::frame) with the
//!   host. A frame runs one flush:
//!
//! ```text
//! read ─▶ resolve shared leads ─▶ start animations ─▶ sample ─▶ project ─▶ write
//! ```
//!
//! Events raised during the flush are dispatched after the write phase. Work
//! listeners request through [`FrameRequests`] is applied after dispatch, so
//! its reads run in the following frame.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::animation::{AnimationDriver, AnimationHandle, Easing, Transition, compress};
use crate::config::ProjectionConfig;
use crate::events::{
    CompletionReason, EventBus, EventKind, FrameRequests, LayoutEvent, SubscriptionId,
};
use crate::geometry::{BoxDelta, LayoutBox};
use crate::host::{InstanceHandle, InstanceHost};
use crate::node::{INVALID, NodeId, NodeOptions, NodeStore, ProjectionChanges};
use crate::scheduler::MeasureScheduler;
use crate::shared::{GroupState, Handoff, LayoutId, SharedLayoutRegistry};
use crate::style::{NodeStyle, ProjectedStyle};
use crate::time::FrameTick;
use crate::trace::{
    AnimationFinishedEvent, AnimationStartedEvent, FlushSummaryBuilder, FrameBeginEvent,
    LeadChangedEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink, Tracer,
};

/// What a frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame counter of the tick.
    pub frame_index: u64,
    /// Instances measured.
    pub reads: usize,
    /// Projected styles written.
    pub writes: usize,
    /// Animations still running.
    pub animations_active: usize,
    /// Whether another frame is needed (running animations or queued work).
    pub needs_frame: bool,
}

/// Layout projection engine for one tree of host instances.
#[derive(Debug)]
pub struct LayoutProjection {
    config: ProjectionConfig,
    store: NodeStore,
    scheduler: MeasureScheduler,
    driver: AnimationDriver,
    shared: SharedLayoutRegistry,
    events: EventBus,
    changes: ProjectionChanges,
    /// Nodes given a new explicit target since the last frame.
    retargets: Vec<NodeId>,
    /// Animations interrupted since they were last traced.
    interrupted: Vec<AnimationHandle>,
}

impl Default for LayoutProjection {
    fn default() -> Self {
        Self::new(ProjectionConfig::standard())
    }
}

impl LayoutProjection {
    /// Creates an empty engine.
    #[must_use]
    pub fn new(config: ProjectionConfig) -> Self {
        Self {
            config,
            store: NodeStore::new(),
            scheduler: MeasureScheduler::new(),
            driver: AnimationDriver::new(),
            shared: SharedLayoutRegistry::new(),
            events: EventBus::new(),
            changes: ProjectionChanges::default(),
            retargets: Vec::new(),
            interrupted: Vec::new(),
        }
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Read access to the node tree.
    #[must_use]
    pub fn tree(&self) -> &NodeStore {
        &self.store
    }

    /// Read access to the measurement queues.
    #[must_use]
    pub fn scheduler(&self) -> &MeasureScheduler {
        &self.scheduler
    }

    /// Read access to the running animations.
    #[must_use]
    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    /// Read access to the shared-identity groups.
    #[must_use]
    pub fn shared(&self) -> &SharedLayoutRegistry {
        &self.shared
    }

    // -- Lifecycle --

    /// Starts tracking `instance` with the configured default options.
    ///
    /// The node is measured in the next frame and appears at rest.
    pub fn create_node(&mut self, instance: InstanceHandle) -> NodeId {
        let options = self.config.node_options();
        self.create_node_with(instance, options)
    }

    /// Starts tracking `instance` with explicit options.
    pub fn create_node_with(&mut self, instance: InstanceHandle, options: NodeOptions) -> NodeId {
        let node = self.store.create_node(instance);
        self.store.set_options(node, options);
        self.scheduler.schedule_read(node);
        node
    }

    /// Stops tracking a node.
    ///
    /// Detaches it from its parent, its shared-identity group, the
    /// measurement queues, the animation driver, and its listeners. No
    /// events fire for the node afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node still has children.
    pub fn destroy_node(&mut self, node: NodeId) {
        self.store.validate(node);
        let idx = node.index();
        if let Some(id) = self.store.layout_id(node).cloned() {
            self.shared.deregister(&id, node, &self.store);
        }
        for follower in self.store.followers_of(idx) {
            self.store.set_follow_at(follower, INVALID);
            let target = self.store.target_at(follower);
            self.store.set_latest_at(follower, target);
        }
        let _ = self.driver.cancel(idx);
        self.scheduler.forget(node);
        self.events.remove_node(node);
        self.retargets.retain(|&n| n != node);
        self.store.destroy_node(node);
    }

    // -- Topology --

    /// Adds `child` as the last child of `parent`. See [`NodeStore::add_child`].
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.store.add_child(parent, child);
    }

    /// Inserts `child` before `sibling`. See [`NodeStore::insert_before`].
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.store.insert_before(child, sibling);
    }

    /// Detaches `child` from its parent. See [`NodeStore::remove_from_parent`].
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.store.remove_from_parent(child);
    }

    /// Moves `child` under `new_parent`. See [`NodeStore::reparent`].
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        self.store.reparent(child, new_parent);
    }

    // -- Properties --

    /// Replaces a node's options.
    pub fn set_options(&mut self, node: NodeId, options: NodeOptions) {
        self.store.set_options(node, options);
    }

    /// Sets the declared border radius and box shadow of a node.
    ///
    /// Between `will_update` and the next frame, the change animates from
    /// the snapshotted style; otherwise it shows at once.
    pub fn set_style(&mut self, node: NodeId, style: NodeStyle) {
        self.store.set_style(node, style);
    }

    // -- Layout updates --

    /// Snapshots the visual box of every node in `root`'s subtree ahead of a
    /// layout mutation.
    ///
    /// Running animations in the subtree are interrupted; the snapshot keeps
    /// their current appearance, so the next animation starts where they
    /// stopped.
    pub fn will_update(&mut self, root: NodeId) {
        let subtree: Vec<u32> = self.store.subtree(root).map(NodeId::index).collect();
        for idx in subtree {
            self.store.snapshot_at(idx);
            self.interrupt(idx);
        }
    }

    /// Queues a read for every node snapshotted since the last call.
    pub fn did_update(&mut self) {
        for idx in self.store.drain_layout() {
            if let Some(node) = self.store.handle_at(idx) {
                self.scheduler.schedule_read(node);
            }
        }
    }

    /// Re-measures `root`'s subtree in the next frame without animating.
    pub fn force_remeasure(&mut self, root: NodeId) {
        let subtree: Vec<NodeId> = self.store.subtree(root).collect();
        for node in subtree {
            self.store.mark_needs_measurement_at(node.index());
            self.scheduler.schedule_read(node);
        }
    }

    /// Makes `target` the box the node converges to, instead of its measured
    /// box. The node animates there from wherever it currently is.
    pub fn set_target_box(&mut self, node: NodeId, target: LayoutBox) {
        self.store.validate(node);
        self.store.set_target_override_at(node.index(), Some(target));
        self.retargets.push(node);
    }

    /// Returns the node to its measured box, animating.
    pub fn clear_target_box(&mut self, node: NodeId) {
        self.store.validate(node);
        self.store.set_target_override_at(node.index(), None);
        self.retargets.push(node);
    }

    // -- Animations --

    /// Animates a correction towards the node's target.
    ///
    /// `delta` is applied on top of whatever correction the node currently
    /// shows, so an identity delta continues from the current appearance.
    /// Any running animation is interrupted. The animation starts in the
    /// next frame.
    pub fn animate_delta(
        &mut self,
        node: NodeId,
        delta: BoxDelta,
        transition: Transition,
    ) -> AnimationHandle {
        self.store.validate(node);
        let idx = node.index();
        let current = self.current_correction(idx);
        self.interrupt(idx);
        let (handle, _) = self
            .driver
            .start(node, current.then(&delta), Box::new(transition));
        handle
    }

    /// Stops an animation. The node snaps to its target.
    ///
    /// Returns `false` if the animation had already ended.
    pub fn cancel_animation(&mut self, handle: AnimationHandle) -> bool {
        if !self.driver.is_active(handle) {
            return false;
        }
        let idx = handle.node().index();
        self.interrupt(idx);
        let target = self.store.target_at(idx);
        self.store.set_latest_at(idx, target);
        let declared = self.store.style[idx as usize];
        self.store.set_current_style_at(idx, declared);
        true
    }

    /// Whether `node` has a running animation.
    #[must_use]
    pub fn is_animating(&self, node: NodeId) -> bool {
        self.driver.is_animating(node)
    }

    // -- Events --

    /// Calls `listener` when an animation on `node` takes its first sample.
    pub fn on_layout_animation_start(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&LayoutEvent, &mut FrameRequests) + 'static,
    ) -> SubscriptionId {
        self.store.validate(node);
        self.events
            .subscribe(node, EventKind::AnimationStart, Box::new(listener))
    }

    /// Calls `listener` when an animation on `node` completes or is
    /// interrupted.
    pub fn on_layout_animation_complete(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&LayoutEvent, &mut FrameRequests) + 'static,
    ) -> SubscriptionId {
        self.store.validate(node);
        self.events
            .subscribe(node, EventKind::AnimationComplete, Box::new(listener))
    }

    /// Calls `listener` when a crossfade involving `node` finishes.
    pub fn on_crossfade_complete(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&LayoutEvent, &mut FrameRequests) + 'static,
    ) -> SubscriptionId {
        self.store.validate(node);
        self.events
            .subscribe(node, EventKind::CrossfadeComplete, Box::new(listener))
    }

    /// Removes a listener. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // -- Shared identity --

    /// Registers `node` under a shared identity, leaving any previous one.
    ///
    /// The node becomes the identity's lead in the next frame.
    pub fn register_shared_identity(&mut self, node: NodeId, id: impl Into<LayoutId>) {
        let id = id.into();
        if self.store.layout_id(node) == Some(&id) {
            return;
        }
        self.deregister_shared_identity(node);
        self.store.set_layout_id_at(node.index(), Some(id.clone()));
        self.shared.register(id, node);
        if self.store.needs_measurement(node) {
            self.scheduler.schedule_read(node);
        }
    }

    /// Removes `node` from its shared identity, if any.
    pub fn deregister_shared_identity(&mut self, node: NodeId) {
        let Some(id) = self.store.layout_id(node).cloned() else {
            return;
        };
        self.shared.deregister(&id, node, &self.store);
        self.store.set_layout_id_at(node.index(), None);
        self.store.set_follow_at(node.index(), INVALID);
        self.store.set_opacity_at(node.index(), None);
    }

    /// The committed lead of a shared identity.
    #[must_use]
    pub fn resolve_lead(&self, id: &LayoutId) -> Option<NodeId> {
        self.shared.resolve_lead(id)
    }

    /// Lifecycle state of a shared identity.
    #[must_use]
    pub fn shared_state(&self, id: &LayoutId) -> GroupState {
        self.shared.state(id)
    }

    // -- Queries --

    /// The style last written (or about to be written) for `node`.
    #[must_use]
    pub fn projected_style(&self, node: NodeId) -> ProjectedStyle {
        self.store.projected_style(node)
    }

    /// The box `node` currently occupies on screen.
    #[must_use]
    pub fn latest_box(&self, node: NodeId) -> Option<LayoutBox> {
        self.store.latest_box(node)
    }

    /// The last measured box of `node`.
    #[must_use]
    pub fn measured_box(&self, node: NodeId) -> Option<LayoutBox> {
        self.store.measured_box(node)
    }

    /// The box `node` converges to.
    #[must_use]
    pub fn target_box(&self, node: NodeId) -> Option<LayoutBox> {
        self.store.target_box(node)
    }

    /// The crossfade opacity override of `node`.
    #[must_use]
    pub fn opacity(&self, node: NodeId) -> Option<f64> {
        self.store.opacity(node)
    }

    // -- Frame --

    /// Runs one flush.
    pub fn frame<H: InstanceHost + ?Sized>(&mut self, tick: FrameTick, host: &mut H) -> FrameReport {
        self.run_frame(tick, host, Tracer::none())
    }

    /// Runs one flush, reporting each stage to `sink`.
    ///
    /// Events reach the sink only with the `trace` feature enabled.
    pub fn frame_traced<H: InstanceHost + ?Sized>(
        &mut self,
        tick: FrameTick,
        host: &mut H,
        sink: &mut dyn TraceSink,
    ) -> FrameReport {
        self.run_frame(tick, host, Tracer::new(sink))
    }

    fn run_frame<H: InstanceHost + ?Sized>(
        &mut self,
        tick: FrameTick,
        host: &mut H,
        mut tracer: Tracer<'_>,
    ) -> FrameReport {
        let frame_index = tick.frame_index;
        let mut summary = FlushSummaryBuilder::new(frame_index, tick.now);
        tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            now: tick.now,
        });
        self.scheduler.begin();

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Read,
        });
        let measured =
            self.scheduler
                .read_phase(&mut self.store, host, &mut tracer, &mut summary);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Read,
            nodes: count(measured.len()),
        });

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Animate,
        });
        self.store.refresh_traversal();
        let mut handoffs = Vec::new();
        for handoff in self.shared.resolve(&self.store) {
            if !self.store.is_alive(handoff.lead) {
                continue;
            }
            tracer.lead_changed(&LeadChangedEvent {
                frame_index,
                lead_index: handoff.lead.index(),
                previous_index: handoff.previous.map(NodeId::index),
            });
            handoffs.extend(self.apply_handoff(&handoff));
        }
        self.start_layout_animations(&measured, &handoffs);
        let sampled = self.sample_animations(tick, &mut tracer, &mut summary);
        for handle in self.interrupted.drain(..) {
            summary.finished();
            tracer.animation_finished(&AnimationFinishedEvent {
                frame_index,
                node_index: handle.node().index(),
                serial: handle.serial(),
                interrupted: true,
            });
        }
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Animate,
            nodes: count(sampled),
        });

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Project,
        });
        let mut changes = core::mem::take(&mut self.changes);
        self.store.project_into(&mut changes);
        for &idx in &changes.styles {
            if let Some(node) = self.store.handle_at(idx) {
                self.scheduler.queue_write(node);
            }
        }
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Project,
            nodes: count(changes.recomputed.len()),
        });
        self.changes = changes;

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Write,
        });
        let writes = self
            .scheduler
            .write_phase(&mut self.store, host, &mut tracer, &mut summary);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Write,
            nodes: count(writes),
        });
        self.scheduler.end();

        self.shared.record_lead_boxes(&self.store);
        let mut requests = FrameRequests::default();
        self.events.dispatch(&mut requests);
        self.apply_requests(requests);
        self.shared.end_frame();

        let animations_active = self.driver.active_count();
        tracer.flush_summary(&summary.finish(count(animations_active)));
        FrameReport {
            frame_index,
            reads: measured.len(),
            writes,
            animations_active,
            needs_frame: animations_active > 0
                || !self.scheduler.is_idle()
                || !self.events.pending().is_empty(),
        }
    }

    /// Turns a lead change into opacity and follow state. Returns the raw
    /// index of a lead that must animate in, with whether it crossfades.
    fn apply_handoff(&mut self, handoff: &Handoff) -> Option<(u32, bool)> {
        let lead = handoff.lead.index();
        let members: Vec<NodeId> = self.shared.members(&handoff.layout_id).to_vec();
        for member in members {
            if member != handoff.lead && Some(member) != handoff.previous {
                self.store.set_follow_at(member.index(), INVALID);
                self.store.set_opacity_at(member.index(), Some(0.0));
            }
        }
        self.store.set_follow_at(lead, INVALID);

        let crossfade = handoff.previous.is_some()
            && handoff.source_box.is_some()
            && self.config.crossfade_for(&self.store.options[lead as usize]);
        if let Some(previous) = handoff.previous {
            if crossfade {
                self.interrupt(previous.index());
                self.store.set_follow_at(previous.index(), lead);
                self.store.set_opacity_at(previous.index(), Some(1.0));
            } else {
                self.store.set_opacity_at(previous.index(), Some(0.0));
                let _ = self.shared.complete_crossfade(&handoff.layout_id);
            }
        }
        self.store
            .set_opacity_at(lead, if crossfade { Some(0.0) } else { None });

        let source = handoff.source_box?;
        self.store
            .set_snapshot_at(lead, source, handoff.source_style);
        Some((lead, crossfade))
    }

    /// Starts, retargets, or settles every node whose layout or target
    /// changed this frame, parents first.
    fn start_layout_animations(&mut self, measured: &[u32], handoffs: &[(u32, bool)]) {
        let mut work: Vec<u32> = measured.to_vec();
        work.extend(handoffs.iter().map(|&(idx, _)| idx));
        for node in core::mem::take(&mut self.retargets) {
            if self.store.is_alive(node) {
                work.push(node.index());
            }
        }
        work.sort_unstable_by_key(|&idx| self.store.rank_at(idx));
        work.dedup();

        for idx in work {
            let retarget = self.store.take_retarget_at(idx);
            if self.store.follow_at(idx) != INVALID {
                let _ = self.store.take_snapshot_at(idx);
                continue;
            }
            let Some(target) = self.store.target_at(idx) else {
                continue;
            };
            let crossfade = handoffs.iter().any(|&(l, c)| l == idx && c);
            if self.store.layout_dirty[idx as usize] {
                let (snapshot, style) = self.store.take_snapshot_at(idx);
                match snapshot {
                    Some(source) => self.animate_layout(idx, source, style, target, crossfade),
                    None => self.settle(idx, target),
                }
            } else if retarget || self.driver.is_animating_at(idx) {
                let source = self.store.visual_box_at(idx).unwrap_or(target);
                let style = Some(self.store.current_style[idx as usize]);
                self.animate_layout(idx, source, style, target, false);
            } else {
                self.settle(idx, target);
            }
        }
    }

    /// Starts the animation from `source` to `target`, or settles the node
    /// if there is nothing to animate.
    fn animate_layout(
        &mut self,
        idx: u32,
        source: LayoutBox,
        source_style: Option<NodeStyle>,
        target: LayoutBox,
        crossfade: bool,
    ) {
        let Some(node) = self.store.handle_at(idx) else {
            return;
        };
        let options = self.store.options[idx as usize];
        let declared = self.store.style[idx as usize];
        let source = options.animation_type.source_box(source, target);
        let unchanged = (source.is_degenerate() && target.is_degenerate())
            || source.rounded_eq(target);
        let style_from = source_style.filter(|s| *s != declared);

        if unchanged && !crossfade && style_from.is_none() {
            self.interrupt(idx);
            self.settle(idx, target);
            return;
        }

        let delta = if unchanged {
            BoxDelta::IDENTITY
        } else {
            BoxDelta::between(target, source, options.origin)
        };
        self.interrupt(idx);
        let transition = self.config.layout_transition_for(&options);
        let _ = self.driver.start(node, delta, Box::new(transition));
        if let Some(from) = style_from {
            let transition = self.config.style_transition_for(&options);
            self.driver
                .attach_style(idx, from, declared, Box::new(transition));
        }
        if crossfade {
            self.driver
                .attach_opacity(idx, Box::new(self.config.crossfade_transition));
        }
    }

    /// Puts a node at rest on `target`.
    fn settle(&mut self, idx: u32, target: LayoutBox) {
        self.store.set_latest_at(idx, Some(target));
        let declared = self.store.style[idx as usize];
        self.store.set_current_style_at(idx, declared);
    }

    /// Samples every running animation, parents first. Returns the number
    /// of animations sampled.
    fn sample_animations(
        &mut self,
        tick: FrameTick,
        tracer: &mut Tracer<'_>,
        summary: &mut FlushSummaryBuilder,
    ) -> usize {
        let mut running = self.driver.indices();
        running.sort_unstable_by_key(|&idx| self.store.rank_at(idx));
        let mut sampled = 0;
        for idx in running {
            let Some(target) = self.store.target_at(idx) else {
                continue;
            };
            let Some(sample) = self.driver.sample(idx, tick.now, target) else {
                continue;
            };
            sampled += 1;
            if sample.started {
                summary.started();
                tracer.animation_started(&AnimationStartedEvent {
                    frame_index: tick.frame_index,
                    node_index: idx,
                    serial: sample.handle.serial(),
                });
                self.events.emit(LayoutEvent::AnimationStart {
                    handle: sample.handle,
                });
            }

            self.store.set_latest_at(idx, Some(sample.latest));
            let style = sample
                .style
                .unwrap_or(self.store.style[idx as usize]);
            self.store.set_current_style_at(idx, style);

            if let Some(p) = sample.opacity {
                self.store
                    .set_opacity_at(idx, Some(compress(0.0, 0.5, Easing::CircOut, p)));
                let fading = 1.0 - compress(0.5, 0.95, Easing::Linear, p);
                for follower in self.store.followers_of(idx) {
                    self.store.set_opacity_at(follower, Some(fading));
                }
            }
            if sample.opacity_finished {
                self.finish_crossfade(idx);
            }

            if sample.finished {
                summary.finished();
                tracer.animation_finished(&AnimationFinishedEvent {
                    frame_index: tick.frame_index,
                    node_index: idx,
                    serial: sample.handle.serial(),
                    interrupted: false,
                });
                self.events.emit(LayoutEvent::AnimationComplete {
                    handle: sample.handle,
                    reason: CompletionReason::Completed,
                });
            }
        }

        // Crossfading followers sit exactly on their lead.
        for idx in self.store.traversal_order().to_vec() {
            let lead = self.store.follow_at(idx);
            if lead != INVALID {
                let latest = self.store.latest[lead as usize];
                self.store.set_latest_at(idx, latest);
            }
        }
        sampled
    }

    /// Ends the crossfade led by the node at `lead`: the lead shows at full
    /// opacity and the previous lead is hidden and released.
    fn finish_crossfade(&mut self, lead: u32) {
        self.store.set_opacity_at(lead, None);
        for follower in self.store.followers_of(lead) {
            self.store.set_follow_at(follower, INVALID);
            self.store.set_opacity_at(follower, Some(0.0));
            let target = self.store.target_at(follower);
            self.store.set_latest_at(follower, target);
        }
        let Some(id) = self.store.layout_id[lead as usize].clone() else {
            return;
        };
        if let Some((lead, previous)) = self.shared.complete_crossfade(&id) {
            self.events.emit(LayoutEvent::CrossfadeComplete {
                layout_id: id,
                lead,
                previous,
            });
        }
    }

    /// Stops the node's animation, if any, and reports the interruption.
    fn interrupt(&mut self, idx: u32) {
        let crossfading = self.driver.has_opacity(idx);
        let Some(handle) = self.driver.cancel(idx) else {
            return;
        };
        self.events.emit(LayoutEvent::AnimationComplete {
            handle,
            reason: CompletionReason::Interrupted,
        });
        self.interrupted.push(handle);
        if crossfading {
            self.finish_crossfade(idx);
        }
    }

    /// The correction the node at `idx` shows relative to its target.
    fn current_correction(&self, idx: u32) -> BoxDelta {
        if let Some(delta) = self.driver.current_delta(idx) {
            return delta;
        }
        let origin = self.store.options[idx as usize].origin;
        match (self.store.target_at(idx), self.store.latest[idx as usize]) {
            (Some(target), Some(latest)) => BoxDelta::between(target, latest, origin),
            _ => BoxDelta::IDENTITY,
        }
    }

    fn apply_requests(&mut self, requests: FrameRequests) {
        for node in requests.will_update {
            if self.store.is_alive(node) {
                self.will_update(node);
            }
        }
        for node in requests.force_remeasure {
            if self.store.is_alive(node) {
                self.force_remeasure(node);
            }
        }
        if requests.did_update {
            self.did_update();
        }
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::RefCell;

    use kurbo::Rect;

    use super::*;
    use crate::geometry::TransformOrigin;
    use crate::host::testing::RecordingHost;
    use crate::style::{BorderRadius, Radius};
    use crate::time::{Duration, HostTime};

    const MS: u64 = 1_000_000;
    const EPS: f64 = 1e-9;

    fn tick(frame_index: u64, ms: u64) -> FrameTick {
        FrameTick::new(frame_index, HostTime(ms * MS))
    }

    fn linear_config(ms: u64) -> ProjectionConfig {
        let transition = Transition::new(Duration::from_millis(ms), Easing::Linear);
        ProjectionConfig {
            layout_transition: transition,
            style_transition: transition,
            crossfade_transition: transition,
            ..ProjectionConfig::standard()
        }
    }

    fn record(
        engine: &mut LayoutProjection,
        node: NodeId,
    ) -> Rc<RefCell<Vec<LayoutEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        engine.on_layout_animation_start(node, move |e, _| l.borrow_mut().push(e.clone()));
        let l = Rc::clone(&log);
        engine.on_layout_animation_complete(node, move |e, _| l.borrow_mut().push(e.clone()));
        let l = Rc::clone(&log);
        engine.on_crossfade_complete(node, move |e, _| l.borrow_mut().push(e.clone()));
        log
    }

    /// One node at `rect`, measured and at rest.
    fn single(config: ProjectionConfig, rect: Rect) -> (LayoutProjection, RecordingHost, NodeId) {
        let mut engine = LayoutProjection::new(config);
        let mut host = RecordingHost::new();
        let node = engine.create_node(InstanceHandle(1));
        host.set(InstanceHandle(1), rect);
        engine.frame(tick(0, 0), &mut host);
        (engine, host, node)
    }

    #[test]
    fn new_node_settles_without_animating() {
        let (engine, host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(host.measure_count(InstanceHandle(1)), 1);
        assert!(!engine.is_animating(node));
        assert_eq!(engine.latest_box(node), engine.measured_box(node));
        assert!(engine.projected_style(node).is_identity());
    }

    #[test]
    fn flush_is_idempotent() {
        let (mut engine, mut host, _) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        host.clear_calls();
        let report = engine.frame(tick(1, 16), &mut host);
        assert_eq!(report.reads, 0);
        assert_eq!(report.writes, 0);
        assert!(!report.needs_frame);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn repeated_updates_read_once() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        host.clear_calls();
        engine.will_update(node);
        engine.will_update(node);
        engine.did_update();
        engine.did_update();
        engine.force_remeasure(node);
        let report = engine.frame(tick(1, 16), &mut host);
        assert_eq!(report.reads, 1);
        assert_eq!(host.measure_count(InstanceHandle(1)), 1);
    }

    #[test]
    fn widening_animates_scale_half_to_one() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        let log = record(&mut engine, node);

        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 200.0, 100.0));
        engine.did_update();

        let report = engine.frame(tick(1, 1_000), &mut host);
        assert_eq!(report.animations_active, 1);
        assert!(report.needs_frame);
        let t = host.last_style(InstanceHandle(1)).unwrap().transform;
        assert!((t.scale.x - 0.5).abs() < EPS);
        assert!((t.scale.y - 1.0).abs() < EPS);
        assert_eq!(t.translate.x, 0.0);

        engine.frame(tick(2, 1_050), &mut host);
        let t = engine.projected_style(node).transform;
        assert!((t.scale.x - 0.75).abs() < EPS);

        let report = engine.frame(tick(3, 1_100), &mut host);
        assert_eq!(report.animations_active, 0);
        assert_eq!(engine.latest_box(node), engine.target_box(node));
        assert!(engine.projected_style(node).transform.is_identity());
        assert!(host.last_style(InstanceHandle(1)).unwrap().is_identity());

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind(), EventKind::AnimationStart);
        assert!(matches!(
            log[1],
            LayoutEvent::AnimationComplete {
                reason: CompletionReason::Completed,
                ..
            }
        ));
    }

    #[test]
    fn retarget_is_continuous() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(200.0, 0.0, 300.0, 100.0));
        engine.did_update();
        engine.frame(tick(1, 0), &mut host);
        engine.frame(tick(2, 40), &mut host);
        let before = engine.latest_box(node).unwrap();

        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(0.0, 300.0, 50.0, 350.0));
        engine.did_update();
        engine.frame(tick(3, 56), &mut host);
        let after = engine.latest_box(node).unwrap();
        assert!(before.approx_eq(after, 0.01), "{before:?} vs {after:?}");

        engine.frame(tick(4, 156), &mut host);
        assert_eq!(
            engine.latest_box(node),
            Some(LayoutBox::new(0.0, 300.0, 50.0, 350.0))
        );
    }

    #[test]
    fn interrupted_animation_reports_interrupted() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        let log = record(&mut engine, node);
        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(50.0, 0.0, 150.0, 100.0));
        engine.did_update();
        engine.frame(tick(1, 0), &mut host);
        engine.will_update(node);
        engine.did_update();
        engine.frame(tick(2, 16), &mut host);
        let log = log.borrow();
        assert!(log.iter().any(|e| matches!(
            e,
            LayoutEvent::AnimationComplete {
                reason: CompletionReason::Interrupted,
                ..
            }
        )));
    }

    #[test]
    fn child_counter_scales_animating_parent() {
        let mut engine = LayoutProjection::new(linear_config(100));
        let mut host = RecordingHost::new();
        let parent = engine.create_node(InstanceHandle(1));
        let child = engine.create_node(InstanceHandle(2));
        engine.add_child(parent, child);
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 100.0, 100.0));
        host.set(InstanceHandle(2), Rect::new(0.0, 0.0, 20.0, 20.0));
        engine.frame(tick(0, 0), &mut host);

        engine.will_update(parent);
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 400.0, 400.0));
        engine.did_update();

        for (i, ms) in [1_000, 1_020, 1_050, 1_080].into_iter().enumerate() {
            engine.frame(tick(i as u64 + 1, ms), &mut host);
            let k = engine.tree().tree_scale(parent).x;
            assert!(k < 1.0, "parent is still animating at {ms} ms");
            let t = engine.projected_style(child).transform;
            assert!((t.scale.x - 1.0 / k).abs() < 1e-9, "at {ms} ms");
            assert!((t.scale.y - 1.0 / k).abs() < 1e-9, "at {ms} ms");
        }
    }

    #[test]
    fn radius_animates_and_is_scale_corrected() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        let round = |r: f64| NodeStyle {
            border_radius: Some(BorderRadius::uniform(Radius::circular(r))),
            box_shadow: None,
        };
        engine.set_style(node, round(0.0));
        engine.will_update(node);
        engine.set_style(node, round(20.0));
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 200.0, 200.0));
        engine.did_update();

        engine.frame(tick(1, 0), &mut host);
        engine.frame(tick(2, 50), &mut host);
        // Half way: radius 10 on a box shown at 0.75 of its layout size.
        let r = engine.projected_style(node).border_radius.unwrap().top_left;
        assert!((r.x - 10.0 / 0.75).abs() < 1e-9);

        engine.frame(tick(3, 100), &mut host);
        assert_eq!(engine.projected_style(node).border_radius, round(20.0).border_radius);
    }

    #[test]
    fn explicit_target_animates_from_latest() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        let goal = LayoutBox::new(100.0, 0.0, 200.0, 100.0);
        engine.set_target_box(node, goal);
        engine.frame(tick(1, 0), &mut host);
        assert!(engine.is_animating(node));
        assert_eq!(engine.latest_box(node), Some(LayoutBox::new(0.0, 0.0, 100.0, 100.0)));
        engine.frame(tick(2, 100), &mut host);
        assert_eq!(engine.latest_box(node), Some(goal));
        let t = engine.projected_style(node).transform;
        assert!((t.translate.x - 100.0).abs() < EPS);

        engine.clear_target_box(node);
        engine.frame(tick(3, 116), &mut host);
        engine.frame(tick(4, 216), &mut host);
        assert!(engine.projected_style(node).transform.is_identity());
    }

    #[test]
    fn animate_delta_runs_to_completion() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        let log = record(&mut engine, node);
        let target = engine.target_box(node).unwrap();
        let offset = BoxDelta::between(
            target,
            LayoutBox::new(-50.0, 0.0, 50.0, 100.0),
            TransformOrigin::TOP_LEFT,
        );
        let handle = engine.animate_delta(node, offset, Transition::new(Duration::from_millis(100), Easing::Linear));
        assert!(engine.driver().is_active(handle));
        engine.frame(tick(1, 0), &mut host);
        assert!((engine.latest_box(node).unwrap().x.min + 50.0).abs() < EPS);
        engine.frame(tick(2, 100), &mut host);
        assert!(!engine.driver().is_active(handle));
        assert_eq!(engine.latest_box(node), Some(target));
        assert_eq!(
            log.borrow().last(),
            Some(&LayoutEvent::AnimationComplete {
                handle,
                reason: CompletionReason::Completed,
            })
        );
    }

    #[test]
    fn cancel_snaps_to_target() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 50.0, 50.0));
        engine.did_update();
        engine.frame(tick(1, 0), &mut host);
        let handle = engine.driver().handle_of(node).unwrap();
        assert!(engine.cancel_animation(handle));
        assert!(!engine.cancel_animation(handle));
        assert_eq!(engine.latest_box(node), engine.measured_box(node));
    }

    #[test]
    fn reduced_motion_snaps_but_reports() {
        let (mut engine, mut host, node) =
            single(ProjectionConfig::reduced_motion(), Rect::new(0.0, 0.0, 100.0, 100.0));
        let log = record(&mut engine, node);
        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(10.0, 10.0, 60.0, 60.0));
        engine.did_update();
        let report = engine.frame(tick(1, 0), &mut host);
        assert_eq!(report.animations_active, 0);
        assert_eq!(engine.latest_box(node), engine.measured_box(node));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn card_crossfade() {
        let mut engine = LayoutProjection::new(ProjectionConfig::standard());
        let mut host = RecordingHost::new();
        let card = LayoutId::from("card");
        let a = engine.create_node(InstanceHandle(1));
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 100.0, 100.0));
        engine.register_shared_identity(a, "card");
        engine.frame(tick(0, 0), &mut host);
        assert_eq!(engine.shared_state(&card), GroupState::SingleLead(a));

        let b = engine.create_node(InstanceHandle(2));
        host.set(InstanceHandle(2), Rect::new(50.0, 50.0, 250.0, 150.0));
        engine.register_shared_identity(b, "card");
        let log = record(&mut engine, b);

        engine.frame(tick(1, 1_000), &mut host);
        assert_eq!(
            engine.shared_state(&card),
            GroupState::Transitioning {
                lead: b,
                previous: a
            }
        );
        let a_box = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        assert!(engine.latest_box(b).unwrap().approx_eq(a_box, 0.01));
        assert_eq!(engine.latest_box(a), engine.latest_box(b));
        assert_eq!(engine.opacity(b), Some(0.0));
        assert_eq!(engine.opacity(a), Some(1.0));

        // A quarter in, the lead is mostly visible and the follower still
        // fully opaque.
        engine.frame(tick(2, 1_112), &mut host);
        assert!(engine.opacity(b).unwrap() > 0.8);
        assert_eq!(engine.opacity(a), Some(1.0));

        engine.frame(tick(3, 1_450), &mut host);
        assert_eq!(engine.shared_state(&card), GroupState::SingleLead(b));
        assert_eq!(engine.latest_box(b), engine.measured_box(b));
        assert_eq!(engine.opacity(b), None);
        assert_eq!(engine.opacity(a), Some(0.0));
        assert_eq!(engine.projected_style(b).opacity, None);
        assert!(log.borrow().iter().any(|e| matches!(
            e,
            LayoutEvent::CrossfadeComplete { lead, previous, .. } if *lead == b && *previous == a
        )));

        engine.deregister_shared_identity(a);
        engine.destroy_node(a);
        assert_eq!(engine.shared_state(&card), GroupState::SingleLead(b));
    }

    #[test]
    fn card_swap_in_one_batch_animates_from_departed_box() {
        let mut engine = LayoutProjection::new(linear_config(100));
        let mut host = RecordingHost::new();
        let card = LayoutId::from("card");
        let a = engine.create_node(InstanceHandle(1));
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 100.0, 100.0));
        engine.register_shared_identity(a, "card");
        engine.frame(tick(0, 0), &mut host);

        engine.destroy_node(a);
        let b = engine.create_node(InstanceHandle(2));
        host.set(InstanceHandle(2), Rect::new(50.0, 50.0, 250.0, 150.0));
        engine.register_shared_identity(b, "card");
        engine.frame(tick(1, 1_000), &mut host);

        assert_eq!(engine.shared_state(&card), GroupState::SingleLead(b));
        assert!(
            engine
                .latest_box(b)
                .unwrap()
                .approx_eq(LayoutBox::new(0.0, 0.0, 100.0, 100.0), 0.01)
        );
        assert_eq!(engine.opacity(b), None);
        engine.frame(tick(2, 1_100), &mut host);
        assert_eq!(engine.latest_box(b), engine.measured_box(b));
    }

    #[test]
    fn detached_instance_is_skipped() {
        let mut engine = LayoutProjection::new(linear_config(100));
        let mut host = RecordingHost::new();
        let a = engine.create_node(InstanceHandle(1));
        let b = engine.create_node(InstanceHandle(2));
        host.set(InstanceHandle(2), Rect::new(0.0, 0.0, 10.0, 10.0));
        host.detach(InstanceHandle(1));
        let report = engine.frame(tick(0, 0), &mut host);
        assert_eq!(report.reads, 1);
        assert_eq!(engine.measured_box(a), None);
        assert!(engine.measured_box(b).is_some());
    }

    #[test]
    fn detached_lead_hands_off_once_measured() {
        let mut engine = LayoutProjection::new(ProjectionConfig::standard());
        let mut host = RecordingHost::new();
        let card = LayoutId::from("card");
        let a = engine.create_node(InstanceHandle(1));
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 100.0, 100.0));
        engine.register_shared_identity(a, "card");
        engine.frame(tick(0, 0), &mut host);

        let b = engine.create_node(InstanceHandle(2));
        host.set(InstanceHandle(2), Rect::new(50.0, 50.0, 250.0, 150.0));
        host.detach(InstanceHandle(2));
        engine.register_shared_identity(b, "card");
        engine.frame(tick(1, 500), &mut host);
        assert_eq!(engine.shared_state(&card), GroupState::SingleLead(a));
        assert_eq!(engine.opacity(a), None);
        assert_eq!(engine.opacity(b), None);

        host.detached.clear();
        engine.force_remeasure(b);
        engine.frame(tick(2, 1_000), &mut host);
        assert_eq!(
            engine.shared_state(&card),
            GroupState::Transitioning {
                lead: b,
                previous: a
            }
        );
        assert_eq!(engine.opacity(b), Some(0.0));

        engine.frame(tick(3, 1_450), &mut host);
        assert_eq!(engine.shared_state(&card), GroupState::SingleLead(b));
        assert_eq!(engine.opacity(b), None);
        assert_eq!(engine.opacity(a), Some(0.0));
        assert_eq!(engine.latest_box(b), engine.measured_box(b));
    }

    #[test]
    fn degenerate_to_degenerate_does_not_animate() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(10.0, 10.0, 10.0, 60.0));
        let log = record(&mut engine, node);
        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(200.0, 200.0, 200.0, 300.0));
        engine.did_update();

        let report = engine.frame(tick(1, 0), &mut host);
        assert_eq!(report.animations_active, 0);
        assert!(!engine.is_animating(node));
        assert_eq!(engine.latest_box(node), engine.measured_box(node));
        assert!(engine.projected_style(node).transform.is_identity());

        engine.frame(tick(2, 16), &mut host);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn collapse_to_zero_area_stays_finite() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        let log = record(&mut engine, node);
        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(50.0, 50.0, 50.0, 50.0));
        engine.did_update();

        for (i, ms) in [0, 50].into_iter().enumerate() {
            engine.frame(tick(i as u64 + 1, ms), &mut host);
            assert!(engine.is_animating(node));
            let t = engine.projected_style(node).transform;
            assert!(t.translate.is_finite(), "{t:?}");
            assert!(t.scale.is_finite(), "{t:?}");
            let latest = engine.latest_box(node).unwrap();
            assert!(latest.x.min.is_finite() && latest.y.max.is_finite());
        }
        let mid = engine.latest_box(node).unwrap();
        assert!((mid.x.min - 25.0).abs() < 0.01, "{mid:?}");

        engine.frame(tick(3, 100), &mut host);
        assert!(!engine.is_animating(node));
        assert_eq!(
            engine.latest_box(node),
            Some(LayoutBox::new(50.0, 50.0, 50.0, 50.0))
        );
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert!(matches!(
            log[1],
            LayoutEvent::AnimationComplete {
                reason: CompletionReason::Completed,
                ..
            }
        ));
    }

    #[test]
    fn will_update_from_listener_runs_next_frame() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        engine.on_layout_animation_start(node, move |e, requests| {
            requests.will_update(e.node());
            requests.did_update();
        });
        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 50.0, 50.0));
        engine.did_update();
        host.clear_calls();

        let report = engine.frame(tick(1, 0), &mut host);
        assert_eq!(host.measure_count(InstanceHandle(1)), 1);
        assert!(report.needs_frame);
        assert_eq!(engine.scheduler().pending_reads(), 1);
        // The listener's snapshot interrupted the animation after the flush.
        assert!(!engine.is_animating(node));

        engine.frame(tick(2, 16), &mut host);
        assert_eq!(host.measure_count(InstanceHandle(1)), 2);
    }

    #[test]
    fn destroy_clears_animation_and_queues() {
        let (mut engine, mut host, node) = single(linear_config(100), Rect::new(0.0, 0.0, 100.0, 100.0));
        engine.will_update(node);
        host.set(InstanceHandle(1), Rect::new(0.0, 0.0, 50.0, 50.0));
        engine.did_update();
        engine.destroy_node(node);
        assert!(engine.scheduler().is_idle());
        let report = engine.frame(tick(1, 0), &mut host);
        assert_eq!(report.reads, 0);
        assert_eq!(engine.tree().node_count(), 0);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_handle_panics() {
        let (mut engine, _, node) = single(linear_config(100), Rect::new(0.0, 0.0, 10.0, 10.0));
        engine.destroy_node(node);
        engine.will_update(node);
    }
}
