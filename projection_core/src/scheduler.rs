// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-synchronized measurement batching.
//!
//! The [`MeasureScheduler`] collects read and write requests for nodes and
//! runs them in two phases per flush: every read, then every write. Batching
//! this way means the host lays out at most once per frame, no matter how
//! many nodes asked to be measured.
//!
//! Both phases run in the node store's depth-first order, so parents are
//! measured and styled before their children. A node appears at most once
//! per phase whatever the number of requests.
//!
//! Requests made while a flush is running are deferred to the next flush.
//!
//! # Usage
//!
//! ```rust,ignore
//! scheduler.schedule_read(node);
//! scheduler.schedule_write(node);
//! let (reads, writes) = scheduler.flush(&mut store, &mut host);
//! ```
//!
//! [`LayoutProjection`](crate::controller::LayoutProjection) drives the
//! phases individually, running animation and projection between them.

use alloc::vec::Vec;

use crate::error::InstanceError;
use crate::geometry::LayoutBox;
use crate::host::InstanceHost;
use crate::node::{NodeId, NodeStore};
use crate::time::HostTime;
use crate::trace::{
    FlushSummaryBuilder, NodeMeasuredEvent, NodeSkippedEvent, PhaseKind, Tracer,
};

/// Two-phase read/write batcher.
#[derive(Debug, Default)]
pub struct MeasureScheduler {
    reads: Vec<NodeId>,
    writes: Vec<NodeId>,
    deferred_reads: Vec<NodeId>,
    deferred_writes: Vec<NodeId>,
    flushing: bool,
}

impl MeasureScheduler {
    /// Creates a scheduler with empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a read of `node` for the next read phase.
    pub fn schedule_read(&mut self, node: NodeId) {
        if self.flushing {
            self.deferred_reads.push(node);
        } else {
            self.reads.push(node);
        }
    }

    /// Queues a write of `node`'s projected style for the next write phase.
    pub fn schedule_write(&mut self, node: NodeId) {
        if self.flushing {
            self.deferred_writes.push(node);
        } else {
            self.writes.push(node);
        }
    }

    /// Whether a flush is running.
    #[must_use]
    pub fn is_flushing(&self) -> bool {
        self.flushing
    }

    /// Number of queued reads, duplicates included.
    #[must_use]
    pub fn pending_reads(&self) -> usize {
        self.reads.len() + self.deferred_reads.len()
    }

    /// Number of queued writes, duplicates included.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.writes.len() + self.deferred_writes.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending_reads() == 0 && self.pending_writes() == 0
    }

    /// Runs one complete flush: every queued read, then every queued write.
    ///
    /// Returns the number of successful reads and writes. A flush with
    /// nothing queued touches neither the store nor the host.
    pub fn flush<H: InstanceHost + ?Sized>(
        &mut self,
        store: &mut NodeStore,
        host: &mut H,
    ) -> (usize, usize) {
        let mut tracer = Tracer::none();
        let mut summary = FlushSummaryBuilder::new(0, HostTime(0));
        self.begin();
        let reads = self.read_phase(store, host, &mut tracer, &mut summary).len();
        let writes = self.write_phase(store, host, &mut tracer, &mut summary);
        self.end();
        (reads, writes)
    }

    // -- Phases, driven by the controller --

    pub(crate) fn begin(&mut self) {
        self.flushing = true;
    }

    /// Queues a write for this flush's write phase, even mid-flush.
    pub(crate) fn queue_write(&mut self, node: NodeId) {
        self.writes.push(node);
    }

    /// Measures every queued node once, in depth-first order.
    ///
    /// Returns the raw indices of the nodes measured successfully.
    pub(crate) fn read_phase<H: InstanceHost + ?Sized>(
        &mut self,
        store: &mut NodeStore,
        host: &mut H,
        tracer: &mut Tracer<'_>,
        summary: &mut FlushSummaryBuilder,
    ) -> Vec<u32> {
        let queue = self.take_ordered(store, true);
        let mut measured = Vec::with_capacity(queue.len());
        for idx in queue {
            let result = host
                .measure(store.instance_at(idx))
                .and_then(|rect| {
                    if rect.is_finite() {
                        Ok(LayoutBox::from(rect).normalized())
                    } else {
                        Err(InstanceError::Unmeasurable)
                    }
                });
            match result {
                Ok(bounds) => {
                    store.set_measured_at(idx, bounds);
                    tracer.node_measured(&NodeMeasuredEvent {
                        frame_index: summary.frame_index(),
                        node_index: idx,
                        bounds,
                    });
                    measured.push(idx);
                }
                Err(error) => {
                    tracing::warn!(node = idx, %error, "skipping node: measure failed");
                    store.clear_pending_layout_at(idx);
                    summary.skipped();
                    tracer.node_skipped(&NodeSkippedEvent {
                        frame_index: summary.frame_index(),
                        node_index: idx,
                        phase: PhaseKind::Read,
                        error,
                    });
                }
            }
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "read counts are bounded by u32 node indices"
        )]
        let count = measured.len() as u32;
        summary.reads(count);
        measured
    }

    /// Applies the projected style of every queued node once, in
    /// depth-first order. Returns the number of successful writes.
    pub(crate) fn write_phase<H: InstanceHost + ?Sized>(
        &mut self,
        store: &mut NodeStore,
        host: &mut H,
        tracer: &mut Tracer<'_>,
        summary: &mut FlushSummaryBuilder,
    ) -> usize {
        let queue = self.take_ordered(store, false);
        let mut written = 0;
        for idx in queue {
            let style = *store.projected_at(idx);
            match host.apply(store.instance_at(idx), &style) {
                Ok(()) => written += 1,
                Err(error) => {
                    tracing::warn!(node = idx, %error, "skipping node: apply failed");
                    summary.skipped();
                    tracer.node_skipped(&NodeSkippedEvent {
                        frame_index: summary.frame_index(),
                        node_index: idx,
                        phase: PhaseKind::Write,
                        error,
                    });
                }
            }
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "write counts are bounded by u32 node indices"
        )]
        let count = written as u32;
        summary.writes(count);
        written
    }

    /// Ends the flush; deferred requests become the next flush's queues.
    pub(crate) fn end(&mut self) {
        self.flushing = false;
        self.reads.append(&mut self.deferred_reads);
        self.writes.append(&mut self.deferred_writes);
    }

    /// Drops every request for `node`.
    pub(crate) fn forget(&mut self, node: NodeId) {
        for queue in [
            &mut self.reads,
            &mut self.writes,
            &mut self.deferred_reads,
            &mut self.deferred_writes,
        ] {
            queue.retain(|&n| n != node);
        }
    }

    /// Takes a live queue as raw indices of live nodes, in depth-first
    /// order, without duplicates.
    fn take_ordered(&mut self, store: &mut NodeStore, reads: bool) -> Vec<u32> {
        let queue = if reads {
            core::mem::take(&mut self.reads)
        } else {
            core::mem::take(&mut self.writes)
        };
        if queue.is_empty() {
            return Vec::new();
        }
        store.refresh_traversal();
        let mut order: Vec<u32> = queue
            .into_iter()
            .filter(|&n| store.is_alive(n))
            .map(|n| n.index())
            .collect();
        order.sort_unstable_by_key(|&idx| store.rank_at(idx));
        order.dedup();
        order
    }
}
