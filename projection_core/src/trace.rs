// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`LayoutProjection::frame_traced`](crate::controller::LayoutProjection::frame_traced)
//! calls at each stage of a flush. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FlushSummaryBuilder`] counts reads, writes, and animation transitions
//! during a frame and produces a [`FlushSummary`] at the end.
//!
//! Independently of this module, skipped instances are logged through
//! [`tracing`] at `warn` level.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::error::InstanceError;
use crate::geometry::LayoutBox;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a flush is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Measuring instances.
    Read,
    /// Starting and sampling layout animations.
    Animate,
    /// Recomputing projected styles.
    Project,
    /// Applying projected styles to instances.
    Write,
}

impl PhaseKind {
    /// Short lowercase name, for log output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Animate => "animate",
            Self::Project => "project",
            Self::Write => "write",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a frame starts.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Host time of the frame.
    pub now: HostTime,
}

/// Marks the beginning of a flush phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a flush phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Nodes the phase touched.
    pub nodes: u32,
}

/// Emitted for every successful read.
#[derive(Clone, Copy, Debug)]
pub struct NodeMeasuredEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Raw slot index of the node.
    pub node_index: u32,
    /// Box reported by the host.
    pub bounds: LayoutBox,
}

/// Emitted when a node is dropped from a flush because its instance failed.
#[derive(Clone, Copy, Debug)]
pub struct NodeSkippedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Raw slot index of the node.
    pub node_index: u32,
    /// Phase in which the failure happened.
    pub phase: PhaseKind,
    /// Why the instance failed.
    pub error: InstanceError,
}

/// Emitted when a layout animation takes its first sample.
#[derive(Clone, Copy, Debug)]
pub struct AnimationStartedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Raw slot index of the node.
    pub node_index: u32,
    /// Serial of the animation.
    pub serial: u64,
}

/// Emitted when a layout animation ends.
#[derive(Clone, Copy, Debug)]
pub struct AnimationFinishedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Raw slot index of the node.
    pub node_index: u32,
    /// Serial of the animation.
    pub serial: u64,
    /// Whether it was cut short by a newer animation or a cancel.
    pub interrupted: bool,
}

/// Emitted when a shared-identity group commits a new lead.
#[derive(Clone, Copy, Debug)]
pub struct LeadChangedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Raw slot index of the new lead.
    pub lead_index: u32,
    /// Raw slot index of the previous lead, if it is still alive.
    pub previous_index: Option<u32>,
}

/// Per-frame counters produced by [`FlushSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time of the frame.
    pub now: HostTime,
    /// Instances measured.
    pub reads: u32,
    /// Projected styles written.
    pub writes: u32,
    /// Instances skipped after a failure.
    pub skipped: u32,
    /// Animations started this frame.
    pub started: u32,
    /// Animations that finished or were interrupted this frame.
    pub finished: u32,
    /// Animations still running at the end of the frame.
    pub animations_active: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a frame starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a flush phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a flush phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after each successful read.
    fn on_node_measured(&mut self, e: &NodeMeasuredEvent) {
        _ = e;
    }

    /// Called when a node is skipped after an instance failure.
    fn on_node_skipped(&mut self, e: &NodeSkippedEvent) {
        _ = e;
    }

    /// Called when an animation takes its first sample.
    fn on_animation_started(&mut self, e: &AnimationStartedEvent) {
        _ = e;
    }

    /// Called when an animation completes or is interrupted.
    fn on_animation_finished(&mut self, e: &AnimationFinishedEvent) {
        _ = e;
    }

    /// Called when a shared-identity group commits a new lead.
    fn on_lead_changed(&mut self, e: &LeadChangedEvent) {
        _ = e;
    }

    /// Called with the per-frame summary.
    fn on_flush_summary(&mut self, s: &FlushSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($(#[$meta:meta])* $name:ident, $method:ident, $event:ty) => {
        $(#[$meta])*
        #[inline]
        pub fn $name(&mut self, e: &$event) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$method(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    dispatch!(
        /// Emits a [`FrameBeginEvent`].
        frame_begin, on_frame_begin, FrameBeginEvent
    );
    dispatch!(
        /// Emits a [`PhaseBeginEvent`].
        phase_begin, on_phase_begin, PhaseBeginEvent
    );
    dispatch!(
        /// Emits a [`PhaseEndEvent`].
        phase_end, on_phase_end, PhaseEndEvent
    );
    dispatch!(
        /// Emits a [`NodeMeasuredEvent`].
        node_measured, on_node_measured, NodeMeasuredEvent
    );
    dispatch!(
        /// Emits a [`NodeSkippedEvent`].
        node_skipped, on_node_skipped, NodeSkippedEvent
    );
    dispatch!(
        /// Emits an [`AnimationStartedEvent`].
        animation_started, on_animation_started, AnimationStartedEvent
    );
    dispatch!(
        /// Emits an [`AnimationFinishedEvent`].
        animation_finished, on_animation_finished, AnimationFinishedEvent
    );
    dispatch!(
        /// Emits a [`LeadChangedEvent`].
        lead_changed, on_lead_changed, LeadChangedEvent
    );
    dispatch!(
        /// Emits a [`FlushSummary`].
        flush_summary, on_flush_summary, FlushSummary
    );
}

// ---------------------------------------------------------------------------
// FlushSummaryBuilder
// ---------------------------------------------------------------------------

/// Counts per-frame work and produces a [`FlushSummary`].
#[derive(Clone, Copy, Debug)]
pub struct FlushSummaryBuilder {
    summary: FlushSummary,
}

impl FlushSummaryBuilder {
    /// Starts a summary for the given frame.
    #[must_use]
    pub fn new(frame_index: u64, now: HostTime) -> Self {
        Self {
            summary: FlushSummary {
                frame_index,
                now,
                ..FlushSummary::default()
            },
        }
    }

    /// Frame the summary belongs to.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.summary.frame_index
    }

    /// Records `n` successful reads.
    pub fn reads(&mut self, n: u32) {
        self.summary.reads += n;
    }

    /// Records `n` successful writes.
    pub fn writes(&mut self, n: u32) {
        self.summary.writes += n;
    }

    /// Records one skipped node.
    pub fn skipped(&mut self) {
        self.summary.skipped += 1;
    }

    /// Records one started animation.
    pub fn started(&mut self) {
        self.summary.started += 1;
    }

    /// Records one finished or interrupted animation.
    pub fn finished(&mut self) {
        self.summary.finished += 1;
    }

    /// Consumes the builder and produces the final [`FlushSummary`].
    #[must_use]
    pub fn finish(self, animations_active: u32) -> FlushSummary {
        FlushSummary {
            animations_active,
            ..self.summary
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            now: HostTime(0),
        });
        sink.on_node_skipped(&NodeSkippedEvent {
            frame_index: 0,
            node_index: 3,
            phase: PhaseKind::Read,
            error: InstanceError::Detached,
        });
        sink.on_flush_summary(&FlushSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 1,
            phase: PhaseKind::Write,
        });
    }

    #[test]
    fn summary_builder_counts() {
        let mut b = FlushSummaryBuilder::new(7, HostTime(100));
        b.reads(3);
        b.reads(1);
        b.writes(2);
        b.skipped();
        b.started();
        b.started();
        b.finished();
        let s = b.finish(1);
        assert_eq!(s.frame_index, 7);
        assert_eq!(s.now, HostTime(100));
        assert_eq!(s.reads, 4);
        assert_eq!(s.writes, 2);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.started, 2);
        assert_eq!(s.finished, 1);
        assert_eq!(s.animations_active, 1);
    }

    #[test]
    fn phase_names() {
        assert_eq!(PhaseKind::Read.name(), "read");
        assert_eq!(PhaseKind::Project.name(), "project");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            measured: Vec<u32>,
        }
        impl TraceSink for RecordingSink {
            fn on_node_measured(&mut self, e: &NodeMeasuredEvent) {
                self.measured.push(e.node_index);
            }
        }

        let mut sink = RecordingSink {
            measured: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.node_measured(&NodeMeasuredEvent {
            frame_index: 0,
            node_index: 9,
            bounds: LayoutBox::ZERO,
        });
        drop(tracer);
        assert_eq!(sink.measured, &[9]);
    }
}
