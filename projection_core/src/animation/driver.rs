// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node layout animations.
//!
//! A layout animation owes its node a correction: a [`BoxDelta`] that maps
//! the node's target box onto where it looked before the layout changed.
//! Each frame the driver samples the animation's timelines and mixes that
//! delta towards identity, so the node's latest box slides from the old
//! appearance (progress 0) to its target (progress 1).
//!
//! Three property groups own independent timelines:
//!
//! - **Transform**: the box itself.
//! - **Style**: border radius and box shadow, mixed between two
//!   [`NodeStyle`]s.
//! - **Opacity**: the crossfade of a shared-identity hand-off.
//!
//! The animation completes once every group has finished. Timelines start
//! on their first sample, so an animation created between frames begins at
//! the next frame.

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::transition::Interpolator;
use crate::geometry::{BoxDelta, LayoutBox};
use crate::node::NodeId;
use crate::style::NodeStyle;
use crate::time::HostTime;

/// Identifies one layout animation.
///
/// Handles stay valid after the animation ends; use
/// [`AnimationDriver::is_active`] to check whether it is still running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationHandle {
    node: NodeId,
    serial: u64,
}

impl AnimationHandle {
    /// The animated node.
    #[inline]
    #[must_use]
    pub const fn node(self) -> NodeId {
        self.node
    }

    /// Serial number, unique per driver.
    #[inline]
    #[must_use]
    pub const fn serial(self) -> u64 {
        self.serial
    }
}

/// One interpolator plus the time it started.
#[derive(Debug)]
pub(crate) struct Timeline {
    interpolator: Box<dyn Interpolator>,
    started: Option<HostTime>,
    progress: f64,
    finished: bool,
}

impl Timeline {
    pub(crate) fn new(interpolator: Box<dyn Interpolator>) -> Self {
        Self {
            interpolator,
            started: None,
            progress: 0.0,
            finished: false,
        }
    }

    /// Advances to `now` and returns the progress.
    pub(crate) fn sample(&mut self, now: HostTime) -> f64 {
        if self.finished {
            return 1.0;
        }
        let started = *self.started.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started);
        if self.interpolator.is_finished(elapsed) {
            self.finished = true;
            self.progress = 1.0;
        } else {
            self.progress = self.interpolator.progress(elapsed);
        }
        self.progress
    }

    pub(crate) fn progress(&self) -> f64 {
        self.progress
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }
}

#[derive(Debug)]
struct StyleTrack {
    from: NodeStyle,
    to: NodeStyle,
    timeline: Timeline,
}

/// A running layout animation.
#[derive(Debug)]
pub(crate) struct LayoutAnimation {
    handle: AnimationHandle,
    delta: BoxDelta,
    transform: Timeline,
    style: Option<StyleTrack>,
    opacity: Option<Timeline>,
    announced: bool,
}

impl LayoutAnimation {
    /// The node's box at transform progress `progress`.
    fn box_at(&self, progress: f64, target: LayoutBox) -> LayoutBox {
        self.delta.mix_to_identity(progress).apply(target)
    }

    fn is_finished(&self) -> bool {
        self.transform.is_finished()
            && self.style.as_ref().is_none_or(|s| s.timeline.is_finished())
            && self.opacity.as_ref().is_none_or(Timeline::is_finished)
    }
}

/// Values produced by sampling one animation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AnimationSample {
    pub(crate) handle: AnimationHandle,
    /// Whether this was the animation's first sample.
    pub(crate) started: bool,
    /// Where the node is on screen.
    pub(crate) latest: LayoutBox,
    /// Mixed style, if a style group is running.
    pub(crate) style: Option<NodeStyle>,
    /// Crossfade progress, if an opacity group is running.
    pub(crate) opacity: Option<f64>,
    /// Whether the opacity group finished on this sample.
    pub(crate) opacity_finished: bool,
    /// Whether every group has finished.
    pub(crate) finished: bool,
}

/// Owns every in-flight layout animation, one slot per node index.
#[derive(Debug, Default)]
pub struct AnimationDriver {
    slots: Vec<Option<LayoutAnimation>>,
    next_serial: u64,
    active: usize,
}

impl AnimationDriver {
    /// Creates a driver with no animations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of running animations.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Whether `node` has a running animation.
    #[must_use]
    pub fn is_animating(&self, node: NodeId) -> bool {
        self.get(node.idx).is_some_and(|a| a.handle.node == node)
    }

    /// Whether the animation behind `handle` is still running.
    #[must_use]
    pub fn is_active(&self, handle: AnimationHandle) -> bool {
        self.get(handle.node.idx)
            .is_some_and(|a| a.handle == handle)
    }

    /// Returns the handle of the node's running animation.
    #[must_use]
    pub fn handle_of(&self, node: NodeId) -> Option<AnimationHandle> {
        self.get(node.idx)
            .map(|a| a.handle)
            .filter(|h| h.node == node)
    }

    /// Starts an animation that owes `delta` relative to the node's target.
    ///
    /// Returns the new handle and, if one was running, the handle of the
    /// interrupted animation.
    pub(crate) fn start(
        &mut self,
        node: NodeId,
        delta: BoxDelta,
        transform: Box<dyn Interpolator>,
    ) -> (AnimationHandle, Option<AnimationHandle>) {
        let interrupted = self.cancel(node.idx);
        let handle = AnimationHandle {
            node,
            serial: self.next_serial,
        };
        self.next_serial += 1;
        let i = node.idx as usize;
        if self.slots.len() <= i {
            self.slots.resize_with(i + 1, || None);
        }
        self.slots[i] = Some(LayoutAnimation {
            handle,
            delta,
            transform: Timeline::new(transform),
            style: None,
            opacity: None,
            announced: false,
        });
        self.active += 1;
        (handle, interrupted)
    }

    /// Adds a style group mixing `from` into `to`.
    pub(crate) fn attach_style(
        &mut self,
        idx: u32,
        from: NodeStyle,
        to: NodeStyle,
        interpolator: Box<dyn Interpolator>,
    ) {
        if let Some(anim) = self.get_mut(idx) {
            anim.style = Some(StyleTrack {
                from,
                to,
                timeline: Timeline::new(interpolator),
            });
        }
    }

    /// Adds an opacity (crossfade) group.
    pub(crate) fn attach_opacity(&mut self, idx: u32, interpolator: Box<dyn Interpolator>) {
        if let Some(anim) = self.get_mut(idx) {
            anim.opacity = Some(Timeline::new(interpolator));
        }
    }

    pub(crate) fn is_animating_at(&self, idx: u32) -> bool {
        self.get(idx).is_some()
    }

    /// Whether the animation at `idx` has a running opacity group.
    pub(crate) fn has_opacity(&self, idx: u32) -> bool {
        self.get(idx).is_some_and(|a| a.opacity.is_some())
    }

    /// Returns the correction the node at `idx` currently shows, relative to
    /// `target`, at the last sampled progress.
    pub(crate) fn current_delta(&self, idx: u32) -> Option<BoxDelta> {
        self.get(idx)
            .map(|a| a.delta.mix_to_identity(a.transform.progress()))
    }

    /// Stops the animation at `idx` without completing it.
    pub(crate) fn cancel(&mut self, idx: u32) -> Option<AnimationHandle> {
        let slot = self.slots.get_mut(idx as usize)?;
        let anim = slot.take()?;
        self.active -= 1;
        Some(anim.handle)
    }

    /// Samples the animation at `idx` at `now`.
    ///
    /// A finished animation is removed; its sample reports `latest ==
    /// target` exactly.
    pub(crate) fn sample(
        &mut self,
        idx: u32,
        now: HostTime,
        target: LayoutBox,
    ) -> Option<AnimationSample> {
        let anim = self.get_mut(idx)?;
        let started = !anim.announced;
        anim.announced = true;

        let progress = anim.transform.sample(now);
        let style = anim.style.as_mut().map(|track| {
            let p = track.timeline.sample(now);
            if track.timeline.is_finished() {
                track.to
            } else {
                track.from.mix(&track.to, p)
            }
        });
        let opacity = anim.opacity.as_mut().map(|t| t.sample(now));
        let opacity_finished = anim.opacity.as_ref().is_some_and(Timeline::is_finished);
        if opacity_finished {
            anim.opacity = None;
        }
        let finished = anim.is_finished();
        let latest = if anim.transform.is_finished() {
            target
        } else {
            anim.box_at(progress, target)
        };
        let handle = anim.handle;

        if finished {
            self.cancel(idx);
        }
        Some(AnimationSample {
            handle,
            started,
            latest,
            style,
            opacity,
            opacity_finished,
            finished,
        })
    }

    /// Raw slot indices with a running animation.
    pub(crate) fn indices(&self) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "slots are indexed by u32 node indices"
                )]
                let idx = i as u32;
                idx
            })
            .collect()
    }

    fn get(&self, idx: u32) -> Option<&LayoutAnimation> {
        self.slots.get(idx as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, idx: u32) -> Option<&mut LayoutAnimation> {
        self.slots.get_mut(idx as usize).and_then(Option::as_mut)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use super::*;
    use crate::animation::{Easing, Transition};
    use crate::geometry::TransformOrigin;
    use crate::host::InstanceHandle;
    use crate::node::NodeStore;
    use crate::style::{BorderRadius, Radius};
    use crate::time::Duration;

    const MS: u64 = 1_000_000;

    fn linear(ms: u64) -> Box<dyn Interpolator> {
        Box::new(Transition::new(Duration::from_millis(ms), Easing::Linear))
    }

    fn node() -> NodeId {
        NodeStore::new().create_node(InstanceHandle(0))
    }

    #[test]
    fn widening_example_scales_half_to_one() {
        let n = node();
        let previous = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let target = LayoutBox::new(0.0, 0.0, 200.0, 100.0);
        let delta = BoxDelta::between(target, previous, TransformOrigin::TOP_LEFT);
        assert!((delta.x.scale - 0.5).abs() < 1e-12);
        assert_eq!(delta.x.translate, 0.0);

        let mut driver = AnimationDriver::new();
        let (handle, interrupted) = driver.start(n, delta, linear(100));
        assert!(interrupted.is_none());

        let s = driver.sample(n.idx, HostTime(0), target).unwrap();
        assert!(s.started);
        assert_eq!(s.latest, previous);

        let s = driver.sample(n.idx, HostTime(50 * MS), target).unwrap();
        assert!(!s.started);
        assert!((s.latest.width() / target.width() - 0.75).abs() < 1e-12);

        let s = driver.sample(n.idx, HostTime(100 * MS), target).unwrap();
        assert!(s.finished);
        assert_eq!(s.latest, target);
        assert!(!driver.is_active(handle));
        assert_eq!(driver.active_count(), 0);
    }

    #[test]
    fn start_is_deferred_to_first_sample() {
        let n = node();
        let mut driver = AnimationDriver::new();
        let target = LayoutBox::new(0.0, 0.0, 10.0, 10.0);
        let delta = BoxDelta::between(target, LayoutBox::new(90.0, 0.0, 100.0, 10.0), TransformOrigin::TOP_LEFT);
        driver.start(n, delta, linear(100));
        // First sample long after creation still starts at progress zero.
        let s = driver.sample(n.idx, HostTime(5_000 * MS), target).unwrap();
        assert!((s.latest.x.min - 90.0).abs() < 1e-12);
    }

    #[test]
    fn restart_interrupts_previous() {
        let n = node();
        let mut driver = AnimationDriver::new();
        let (first, _) = driver.start(n, BoxDelta::IDENTITY, linear(100));
        let (second, interrupted) = driver.start(n, BoxDelta::IDENTITY, linear(100));
        assert_eq!(interrupted, Some(first));
        assert!(!driver.is_active(first));
        assert!(driver.is_active(second));
        assert!(driver.is_animating(n));
        assert_eq!(driver.handle_of(n), Some(second));
        assert_eq!(driver.active_count(), 1);
    }

    #[test]
    fn groups_finish_independently() {
        let n = node();
        let mut driver = AnimationDriver::new();
        let target = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        driver.start(n, BoxDelta::IDENTITY, linear(100));
        let round = |r: f64| NodeStyle {
            border_radius: Some(BorderRadius::uniform(Radius::circular(r))),
            box_shadow: None,
        };
        driver.attach_style(n.idx, round(0.0), round(20.0), linear(300));

        let _ = driver.sample(n.idx, HostTime(0), target);
        let s = driver.sample(n.idx, HostTime(150 * MS), target).unwrap();
        assert_eq!(s.latest, target);
        assert!(!s.finished);
        let mid = s.style.unwrap().border_radius.unwrap().top_left.x;
        assert!((mid - 10.0).abs() < 1e-9);

        let s = driver.sample(n.idx, HostTime(300 * MS), target).unwrap();
        assert!(s.finished);
        assert_eq!(s.style, Some(round(20.0)));
    }

    #[test]
    fn cancel_reports_handle_once() {
        let n = node();
        let mut driver = AnimationDriver::new();
        let (handle, _) = driver.start(n, BoxDelta::IDENTITY, linear(100));
        assert_eq!(driver.cancel(n.idx), Some(handle));
        assert_eq!(driver.cancel(n.idx), None);
        assert!(driver.sample(n.idx, HostTime(0), LayoutBox::ZERO).is_none());
    }
}
