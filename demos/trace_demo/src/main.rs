// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated frame loop that exercises the projection engine and its
//! diagnostics pipeline.
//!
//! Drives a headless host through two scenes: a list whose items swap
//! places, and a thumbnail that hands its shared identity to a detail view.
//! Events go to both a [`PrettyPrintSink`](projection_debug::pretty::PrettyPrintSink)
//! and a [`RecorderSink`](projection_debug::recorder::RecorderSink), and the
//! recording is exported as a Chrome trace JSON file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;

use kurbo::Rect;

use projection_core::controller::LayoutProjection;
use projection_core::error::InstanceError;
use projection_core::events::LayoutEvent;
use projection_core::host::{InstanceHandle, InstanceHost};
use projection_core::shared::LayoutId;
use projection_core::style::{BorderRadius, NodeStyle, ProjectedStyle, Radius};
use projection_core::time::{FrameTick, HostTime};
use projection_core::trace::{
    AnimationFinishedEvent, AnimationStartedEvent, FlushSummary, FrameBeginEvent,
    LeadChangedEvent, NodeMeasuredEvent, NodeSkippedEvent, PhaseBeginEvent, PhaseEndEvent,
    TraceSink,
};

use projection_debug::pretty::PrettyPrintSink;
use projection_debug::recorder::RecorderSink;

const FRAME_COUNT: u64 = 90;
/// 16.6ms refresh interval in nanoseconds (≈60 Hz).
const REFRESH_INTERVAL_NS: u64 = 16_666_667;

const LIST: InstanceHandle = InstanceHandle(1);
const ITEM_A: InstanceHandle = InstanceHandle(2);
const ITEM_B: InstanceHandle = InstanceHandle(3);
const THUMB: InstanceHandle = InstanceHandle(10);
const DETAIL: InstanceHandle = InstanceHandle(11);
const GHOST: InstanceHandle = InstanceHandle(99);

/// Host that lays instances out from a table and counts applied styles.
#[derive(Debug, Default)]
struct SimulatedHost {
    layout: BTreeMap<InstanceHandle, Rect>,
    applied: usize,
}

impl InstanceHost for SimulatedHost {
    fn measure(&mut self, instance: InstanceHandle) -> Result<Rect, InstanceError> {
        self.layout
            .get(&instance)
            .copied()
            .ok_or(InstanceError::Detached)
    }

    fn apply(
        &mut self,
        instance: InstanceHandle,
        _style: &ProjectedStyle,
    ) -> Result<(), InstanceError> {
        if self.layout.contains_key(&instance) {
            self.applied += 1;
            Ok(())
        } else {
            Err(InstanceError::Detached)
        }
    }
}

/// Forwards every event to two sinks.
struct Tee<'a> {
    a: &'a mut dyn TraceSink,
    b: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.a.on_frame_begin(e);
        self.b.on_frame_begin(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.a.on_phase_begin(e);
        self.b.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.a.on_phase_end(e);
        self.b.on_phase_end(e);
    }

    fn on_node_measured(&mut self, e: &NodeMeasuredEvent) {
        self.a.on_node_measured(e);
        self.b.on_node_measured(e);
    }

    fn on_node_skipped(&mut self, e: &NodeSkippedEvent) {
        self.a.on_node_skipped(e);
        self.b.on_node_skipped(e);
    }

    fn on_animation_started(&mut self, e: &AnimationStartedEvent) {
        self.a.on_animation_started(e);
        self.b.on_animation_started(e);
    }

    fn on_animation_finished(&mut self, e: &AnimationFinishedEvent) {
        self.a.on_animation_finished(e);
        self.b.on_animation_finished(e);
    }

    fn on_lead_changed(&mut self, e: &LeadChangedEvent) {
        self.a.on_lead_changed(e);
        self.b.on_lead_changed(e);
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        self.a.on_flush_summary(s);
        self.b.on_flush_summary(s);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout())).quiet();
    let mut recorder = RecorderSink::new();

    // -- scene -------------------------------------------------------------
    let mut host = SimulatedHost::default();
    let mut engine = LayoutProjection::default();

    let list = engine.create_node(LIST);
    let item_a = engine.create_node(ITEM_A);
    let item_b = engine.create_node(ITEM_B);
    engine.add_child(list, item_a);
    engine.add_child(list, item_b);
    host.layout.insert(LIST, Rect::new(0.0, 0.0, 320.0, 200.0));
    host.layout.insert(ITEM_A, Rect::new(10.0, 10.0, 310.0, 90.0));
    host.layout.insert(ITEM_B, Rect::new(10.0, 110.0, 310.0, 190.0));

    let thumb = engine.create_node(THUMB);
    host.layout.insert(THUMB, Rect::new(400.0, 20.0, 480.0, 100.0));
    engine.set_style(
        thumb,
        NodeStyle {
            border_radius: Some(BorderRadius::uniform(Radius::circular(8.0))),
            box_shadow: None,
        },
    );
    engine.register_shared_identity(thumb, "hero");

    // Never laid out by the host: every read of it is skipped.
    let _ghost = engine.create_node(GHOST);

    engine.on_layout_animation_complete(item_a, |event, _| {
        println!("[listener] {event:?}");
    });

    // -- simulated loop ----------------------------------------------------
    let mut now: u64 = 1_000_000_000; // start at 1s
    let mut detail = None;

    for frame_index in 0..FRAME_COUNT {
        match frame_index {
            // Swap the two list items.
            10 => {
                engine.will_update(list);
                host.layout.insert(ITEM_A, Rect::new(10.0, 110.0, 310.0, 190.0));
                host.layout.insert(ITEM_B, Rect::new(10.0, 10.0, 310.0, 90.0));
                engine.did_update();
            }
            // Grow the list mid-animation; the items' counter-scale keeps
            // them undistorted.
            20 => {
                engine.will_update(list);
                host.layout.insert(LIST, Rect::new(0.0, 0.0, 320.0, 400.0));
                engine.did_update();
            }
            // Open the detail view; the thumbnail hands off "hero".
            45 => {
                let node = engine.create_node(DETAIL);
                host.layout.insert(DETAIL, Rect::new(40.0, 220.0, 440.0, 520.0));
                engine.set_style(
                    node,
                    NodeStyle {
                        border_radius: Some(BorderRadius::uniform(Radius::circular(24.0))),
                        box_shadow: None,
                    },
                );
                engine.register_shared_identity(node, "hero");
                engine.on_crossfade_complete(node, |event, _| {
                    if let LayoutEvent::CrossfadeComplete {
                        layout_id,
                        lead,
                        previous,
                    } = event
                    {
                        println!("[listener] {layout_id} crossfade done: {lead:?} replaced {previous:?}");
                    }
                });
                detail = Some(node);
            }
            _ => {}
        }

        let tick = FrameTick::new(frame_index, HostTime(now));
        let mut tee = Tee {
            a: &mut pretty,
            b: &mut recorder,
        };
        let report = engine.frame_traced(tick, &mut host, &mut tee);
        if !report.needs_frame && frame_index > 80 {
            break;
        }

        now += REFRESH_INTERVAL_NS;
    }

    let hero = LayoutId::from("hero");
    println!(
        "hero lead: {:?} (detail: {detail:?}), {} styles applied",
        engine.resolve_lead(&hero),
        host.applied,
    );

    // -- export Chrome trace -----------------------------------------------
    let path = "layout_trace.json";
    let file = File::create(path).expect("failed to create layout_trace.json");
    let mut writer = BufWriter::new(file);
    projection_debug::chrome::export(recorder.events(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({} events)", recorder.events().len());
}
