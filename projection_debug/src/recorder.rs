// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps every event it
//! receives as a [`RecordedEvent`], in arrival order.

use projection_core::trace::{
    AnimationFinishedEvent, AnimationStartedEvent, FlushSummary, FrameBeginEvent,
    LeadChangedEvent, NodeMeasuredEvent, NodeSkippedEvent, PhaseBeginEvent, PhaseEndEvent,
    TraceSink,
};

/// One event captured by a [`RecorderSink`].
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// See [`TraceSink::on_frame_begin`].
    FrameBegin(FrameBeginEvent),
    /// See [`TraceSink::on_phase_begin`].
    PhaseBegin(PhaseBeginEvent),
    /// See [`TraceSink::on_phase_end`].
    PhaseEnd(PhaseEndEvent),
    /// See [`TraceSink::on_node_measured`].
    NodeMeasured(NodeMeasuredEvent),
    /// See [`TraceSink::on_node_skipped`].
    NodeSkipped(NodeSkippedEvent),
    /// See [`TraceSink::on_animation_started`].
    AnimationStarted(AnimationStartedEvent),
    /// See [`TraceSink::on_animation_finished`].
    AnimationFinished(AnimationFinishedEvent),
    /// See [`TraceSink::on_lead_changed`].
    LeadChanged(LeadChangedEvent),
    /// See [`TraceSink::on_flush_summary`].
    FlushSummary(FlushSummary),
}

impl RecordedEvent {
    /// Frame counter the event belongs to.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        match self {
            Self::FrameBegin(e) => e.frame_index,
            Self::PhaseBegin(e) => e.frame_index,
            Self::PhaseEnd(e) => e.frame_index,
            Self::NodeMeasured(e) => e.frame_index,
            Self::NodeSkipped(e) => e.frame_index,
            Self::AnimationStarted(e) => e.frame_index,
            Self::AnimationFinished(e) => e.frame_index,
            Self::LeadChanged(e) => e.frame_index,
            Self::FlushSummary(s) => s.frame_index,
        }
    }
}

/// A [`TraceSink`] that records events into a `Vec`.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Drops every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.events.push(RecordedEvent::FrameBegin(*e));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.events.push(RecordedEvent::PhaseBegin(*e));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.events.push(RecordedEvent::PhaseEnd(*e));
    }

    fn on_node_measured(&mut self, e: &NodeMeasuredEvent) {
        self.events.push(RecordedEvent::NodeMeasured(*e));
    }

    fn on_node_skipped(&mut self, e: &NodeSkippedEvent) {
        self.events.push(RecordedEvent::NodeSkipped(*e));
    }

    fn on_animation_started(&mut self, e: &AnimationStartedEvent) {
        self.events.push(RecordedEvent::AnimationStarted(*e));
    }

    fn on_animation_finished(&mut self, e: &AnimationFinishedEvent) {
        self.events.push(RecordedEvent::AnimationFinished(*e));
    }

    fn on_lead_changed(&mut self, e: &LeadChangedEvent) {
        self.events.push(RecordedEvent::LeadChanged(*e));
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        self.events.push(RecordedEvent::FlushSummary(*s));
    }
}
