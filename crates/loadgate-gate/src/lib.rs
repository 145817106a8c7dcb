//! loadgate-gate — the admission gate in front of a processing chain.
//!
//! # Components
//!
//! - **`matcher`** — Anchored regex path patterns deciding what is filtered
//! - **`throttler`** — `RequestThrottler`: evaluate, wait once, proceed
//! - **`stats`** — Pass-through / admitted / throttled counters

pub mod matcher;
pub mod stats;
pub mod throttler;

pub use matcher::PathMatcher;
pub use stats::{GateSnapshot, GateStats};
pub use throttler::RequestThrottler;
