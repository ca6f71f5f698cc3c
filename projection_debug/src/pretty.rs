// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times
//! are printed in milliseconds.

use std::io::Write;

use projection_core::time::HostTime;
use projection_core::trace::{
    AnimationFinishedEvent, AnimationStartedEvent, FlushSummary, FrameBeginEvent,
    LeadChangedEvent, NodeMeasuredEvent, NodeSkippedEvent, PhaseBeginEvent, PhaseEndEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    /// Also print per-node events (reads, animation starts and ends).
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            verbose: true,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            verbose: true,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: true,
        }
    }

    /// Restricts output to frame, phase, lead, and summary lines.
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.verbose = false;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.nanos() as f64 / 1_000_000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] {} at {:.3}ms",
            e.frame_index,
            ms(e.now),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}",
            e.frame_index,
            e.phase.name(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} nodes={}",
            e.frame_index,
            e.phase.name(),
            e.nodes,
        );
    }

    fn on_node_measured(&mut self, e: &NodeMeasuredEvent) {
        if !self.verbose {
            return;
        }
        let b = e.bounds;
        let _ = writeln!(
            self.writer,
            "[measure] frame={} node={} x={:.1}..{:.1} y={:.1}..{:.1}",
            e.frame_index, e.node_index, b.x.min, b.x.max, b.y.min, b.y.max,
        );
    }

    fn on_node_skipped(&mut self, e: &NodeSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] frame={} node={} phase={}: {}",
            e.frame_index,
            e.node_index,
            e.phase.name(),
            e.error,
        );
    }

    fn on_animation_started(&mut self, e: &AnimationStartedEvent) {
        if !self.verbose {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[anim:start] frame={} node={} serial={}",
            e.frame_index, e.node_index, e.serial,
        );
    }

    fn on_animation_finished(&mut self, e: &AnimationFinishedEvent) {
        if !self.verbose {
            return;
        }
        let how = if e.interrupted {
            "interrupted"
        } else {
            "completed"
        };
        let _ = writeln!(
            self.writer,
            "[anim:end] frame={} node={} serial={} {how}",
            e.frame_index, e.node_index, e.serial,
        );
    }

    fn on_lead_changed(&mut self, e: &LeadChangedEvent) {
        let _ = match e.previous_index {
            Some(previous) => writeln!(
                self.writer,
                "[lead] frame={} node={} (from {previous})",
                e.frame_index, e.lead_index,
            ),
            None => writeln!(
                self.writer,
                "[lead] frame={} node={}",
                e.frame_index, e.lead_index,
            ),
        };
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} reads={} writes={} skipped={} \
             started={} finished={} active={}",
            s.frame_index,
            s.reads,
            s.writes,
            s.skipped,
            s.started,
            s.finished,
            s.animations_active,
        );
    }
}
