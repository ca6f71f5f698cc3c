// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by host capabilities.

use thiserror::Error;

/// Failure of an [`InstanceHost`](crate::host::InstanceHost) operation.
///
/// These never escape a flush: the scheduler skips the affected node,
/// logs a warning, and carries on with its siblings.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum InstanceError {
    /// The instance is no longer attached to the host tree.
    #[error("instance is detached from the host tree")]
    Detached,
    /// The instance is attached but has no measurable layout box.
    #[error("instance has no measurable layout box")]
    Unmeasurable,
}
