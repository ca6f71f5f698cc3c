// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads events captured by a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! The engine never reads a clock during a frame, so every event is stamped
//! with the host time of the frame it belongs to. Animations become async
//! spans keyed by their serial, one track per node.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use projection_core::time::HostTime;

use crate::recorder::RecordedEvent;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let mut out: Vec<Value> = Vec::new();
    let mut now = HostTime(0);

    for recorded in events {
        match recorded {
            RecordedEvent::FrameBegin(e) => {
                now = e.now;
                out.push(json!({
                    "ph": "i",
                    "name": "Frame",
                    "cat": "Frame",
                    "ts": host_us(now),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                out.push(json!({
                    "ph": "B",
                    "name": e.phase.name(),
                    "cat": "Flush",
                    "ts": host_us(now),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                out.push(json!({
                    "ph": "E",
                    "name": e.phase.name(),
                    "cat": "Flush",
                    "ts": host_us(now),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "nodes": e.nodes,
                    }
                }));
            }
            RecordedEvent::NodeMeasured(e) => {
                let b = e.bounds;
                out.push(json!({
                    "ph": "i",
                    "name": "Measure",
                    "cat": "Node",
                    "ts": host_us(now),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "node": e.node_index,
                        "bounds": [b.x.min, b.y.min, b.x.max, b.y.max],
                    }
                }));
            }
            RecordedEvent::NodeSkipped(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "Skipped",
                    "cat": "Node",
                    "ts": host_us(now),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "node": e.node_index,
                        "phase": e.phase.name(),
                        "error": e.error.to_string(),
                    }
                }));
            }
            RecordedEvent::AnimationStarted(e) => {
                out.push(json!({
                    "ph": "b",
                    "name": "LayoutAnimation",
                    "cat": "Animation",
                    "id": e.serial,
                    "ts": host_us(now),
                    "pid": 0,
                    "tid": e.node_index,
                    "args": {
                        "frame_index": e.frame_index,
                        "node": e.node_index,
                    }
                }));
            }
            RecordedEvent::AnimationFinished(e) => {
                out.push(json!({
                    "ph": "e",
                    "name": "LayoutAnimation",
                    "cat": "Animation",
                    "id": e.serial,
                    "ts": host_us(now),
                    "pid": 0,
                    "tid": e.node_index,
                    "args": {
                        "frame_index": e.frame_index,
                        "interrupted": e.interrupted,
                    }
                }));
            }
            RecordedEvent::LeadChanged(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "LeadChanged",
                    "cat": "Shared",
                    "ts": host_us(now),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "lead": e.lead_index,
                        "previous": e.previous_index,
                    }
                }));
            }
            RecordedEvent::FlushSummary(s) => {
                out.push(json!({
                    "ph": "i",
                    "name": "FlushSummary",
                    "cat": "Summary",
                    "ts": host_us(s.now),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "reads": s.reads,
                        "writes": s.writes,
                        "skipped": s.skipped,
                        "started": s.started,
                        "finished": s.finished,
                        "animations_active": s.animations_active,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}

fn host_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}
