// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Projection node tree.
//!
//! A *node* tracks one host instance whose layout may animate. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree. Insertion order is traversal order.
//! - **Boxes**: the `measured` layout box reported by the host, the
//!   `snapshot` captured before a mutation, an optional explicit `target`,
//!   and the `latest` box the node currently occupies on screen.
//! - **Computed properties** produced by [`project`](NodeStore::project):
//!   the node's visual map, its combined visual scale, and the
//!   [`ProjectedStyle`](crate::style::ProjectedStyle) to write.
//!
//! At rest `measured == target == latest` and every projected transform is
//! identity.
//!
//! # Dirty tracking
//!
//! Box and style mutations mark the corresponding dirty channel (see
//! [`dirty`](crate::dirty)). PROJECTION propagates to descendants; LAYOUT
//! and STYLE are local; TOPOLOGY triggers a traversal-order rebuild.

mod id;
mod options;
mod project;
mod store;
mod traverse;

pub use id::{INVALID, NodeId};
pub use options::{AnimationType, NodeOptions};
pub use project::ProjectionChanges;
pub use store::NodeStore;
pub use traverse::{Children, Subtree};
