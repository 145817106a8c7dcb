//! loadgate-throttle — sliding-window admission state.
//!
//! # Architecture
//!
//! ```text
//! ThrottlingState
//!   ├── estimator.estimate() → capacity (resize ring when it changes)
//!   ├── ring.next_slot() older than 60s → claim, NoThrottle
//!   └── otherwise → Throttle { delay = 60s - age of slot }
//! ```
//!
//! The whole evaluation runs under a single mutex. Resizing allocates a new
//! backing vector while the lock is held and swaps it in.

pub mod ring;
pub mod state;

pub use ring::TimestampRing;
pub use state::ThrottlingState;
