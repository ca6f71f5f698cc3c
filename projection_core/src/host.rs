// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for measuring and styling instances.
//!
//! The engine never inspects the elements it animates. Each node carries an
//! opaque [`InstanceHandle`], and everything that touches the host tree goes
//! through the [`InstanceHost`] capability:
//!
//! - **Measure**: report an instance's layout box in viewport space, as
//!   laid out by the host with no projection transform applied.
//! - **Apply**: write a [`ProjectedStyle`] (transform, transform origin,
//!   corrected border radius and box shadow, crossfade opacity) to an
//!   instance.
//!
//! One implementation per kind of element (DOM box, SVG element, scene node)
//! is enough; the core depends only on this trait.
//!
//! # Frame loop pseudocode
//!
//! ```rust,ignore
//! fn on_animation_frame(now: HostTime) {
//!     // Application mutations for this frame, bracketed by
//!     // will_update/did_update, have already run.
//!     let report = projection.frame(FrameTick::new(index, now), &mut host);
//!     if report.animations_active > 0 {
//!         request_next_frame();
//!     }
//! }
//! ```

use core::fmt;

use kurbo::Rect;

use crate::error::InstanceError;
use crate::style::ProjectedStyle;

/// An opaque reference to a host element.
///
/// The engine stores and passes these back to the [`InstanceHost`] but never
/// interprets them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceHandle(pub u64);

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceHandle({})", self.0)
    }
}

/// Measures instances and applies projected styles to them.
///
/// Both calls may fail with [`InstanceError`]. The scheduler skips the node
/// for the current flush and continues with its siblings.
pub trait InstanceHost {
    /// Returns the layout box of `instance` in viewport space, without any
    /// projection transform applied.
    fn measure(&mut self, instance: InstanceHandle) -> Result<Rect, InstanceError>;

    /// Writes `style` to `instance`.
    fn apply(&mut self, instance: InstanceHandle, style: &ProjectedStyle)
    -> Result<(), InstanceError>;
}
