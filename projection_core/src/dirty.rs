// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The node store uses multi-channel dirty tracking (via [`understory_dirty`])
//! to decide which nodes a frame has to touch.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`PROJECTION`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from child to parent. A node's render correction depends on its
//!   parent's visual map, so marking a parent marks every descendant.
//!
//! - **Local-only**: [`LAYOUT`] and [`STYLE`] are marked with the default
//!   policy. [`LAYOUT`] collects the nodes snapshotted by
//!   [`will_update`](crate::controller::LayoutProjection::will_update) that
//!   [`did_update`](crate::controller::LayoutProjection::did_update) hands to
//!   the read queue. [`STYLE`] collects nodes whose declared or animated
//!   border radius, box shadow, or crossfade opacity changed.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on topology mutations. It
//!   triggers a traversal-order rebuild but does not propagate.

use understory_dirty::Channel;

/// Snapshotted before a mutation, awaiting a read.
pub const LAYOUT: Channel = Channel::new(0);

/// Measured or latest box changed; descendants must be re-projected.
pub const PROJECTION: Channel = Channel::new(1);

/// Corrected style inputs changed; no propagation needed.
pub const STYLE: Channel = Channel::new(2);

/// Tree topology changed; triggers traversal order rebuild.
pub const TOPOLOGY: Channel = Channel::new(3);
