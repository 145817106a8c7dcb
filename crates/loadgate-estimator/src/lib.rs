//! loadgate-estimator — live load to admission capacity.
//!
//! A `LoadSource` reports the current load percentage; a `LoadEstimator`
//! turns it into the number of admission slots the throttling ring should
//! hold right now.
//!
//! # Capacity Formula
//!
//! ```text
//! if current >= target:
//!     capacity = floor
//! else:
//!     capacity = min(baseline, trunc(baseline * (100 - current) / (100 - target)))
//!
//! capacity = max(capacity, floor, 1)
//! ```
//!
//! Below target the headroom ratio is always above 1, so the cap applies and
//! capacity is a step between `baseline` and `floor`; it does not degrade
//! gradually with load.
//!
//! A failed sample counts as "under pressure" and yields the floor.

pub mod estimator;
pub mod source;

pub use estimator::{proportional_capacity, CpuLoadEstimator, FixedLoadEstimator, LoadEstimator};
pub use source::{FixedLoadSource, LoadSampleError, LoadSource, ProcStatLoadSource};
