// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Projection-based layout animation for trees of rectangular elements.
//!
//! `projection_core` animates elements between layouts without animating
//! layout itself. The host lays an element out at its new position; the
//! engine measures the old and new boxes and writes a transform that makes
//! the element *look* like it is still at the old box, then eases that
//! transform back to identity. Nested elements get counter-transforms so
//! they do not inherit their ancestors' distortion.
//!
//! The crate is `no_std` compatible (with `alloc`) and stores nodes in
//! struct-of-arrays form behind generational handles.
//!
//! # Architecture
//!
//! ```text
//!   will_update(node) ── snapshot ──┐
//!   did_update() ─── schedule read ─┤
//!                                   ▼
//!   frame(tick, host) ── read ──► resolve leads ──► animate ──► project ──► write
//!                                                                              │
//!                 ┌────────────────────────────────────────────────────────────┘
//!                 ▼
//!   LayoutEvent ──► listeners ──► FrameRequests (next frame)
//! ```
//!
//! **[`controller`]** — [`LayoutProjection`](controller::LayoutProjection),
//! the entry point that owns every other piece of state and runs a frame.
//!
//! **[`node`]** — Struct-of-arrays node tree with generational handles and
//! the top-down projection pass with ancestor scale correction.
//!
//! **[`scheduler`]** — Batches host reads and writes so every frame measures
//! before it writes, at most once per node.
//!
//! **[`animation`]** — Easing curves, tweens and springs, and the driver
//! that owns in-flight layout animations.
//!
//! **[`shared`]** — Shared-identity groups: elements that stand for the same
//! logical thing and hand off to each other with a crossfade.
//!
//! **[`events`]** — Animation lifecycle notifications, delivered after each
//! frame.
//!
//! **[`geometry`]**, **[`transform`]**, **[`style`]** — Boxes, deltas, the
//! transform written to the host, and scale-corrected border radius and box
//! shadow.
//!
//! **[`host`]** — The [`InstanceHost`](host::InstanceHost) trait the host
//! implements to measure and style its elements.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! frame instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animation;
pub mod config;
pub mod controller;
pub mod dirty;
pub mod error;
pub mod events;
pub mod geometry;
pub mod host;
pub mod node;
pub mod scheduler;
pub mod shared;
pub mod style;
pub mod time;
pub mod trace;
pub mod transform;
