//! `fleetcast-device` — the device-facing selection layer.
//!
//! The device-automation driver itself lives outside this workspace; it
//! implements [`ItemSource`] over its page/scroll primitives and hands it to
//! [`SelectionSampler`], which owns the randomized bounded-selection
//! algorithm (small-collection fast path, one-per-page large-collection
//! walk, shortfall reporting).

pub mod error;
pub mod sampler;
pub mod source;

pub use error::{DeviceError, Result};
pub use sampler::{scroll_budget, SelectionSampler, MAX_EMPTY_LOOPS, SMALL_COLLECTION_MAX};
pub use source::ItemSource;
