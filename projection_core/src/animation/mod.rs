// Copyright 2026 the Projection Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout animation: easing curves, transitions, and the per-node driver.

mod driver;
mod easing;
mod transition;

pub use driver::{AnimationDriver, AnimationHandle};
pub(crate) use driver::AnimationSample;
pub use easing::{Easing, compress};
pub use transition::{Interpolator, Spring, Transition};
