//! Gate counters.
//!
//! Plain atomics; readers get a point-in-time `GateSnapshot`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use loadgate_core::ThrottlingDecision;

#[derive(Debug, Default)]
pub struct GateStats {
    /// Requests whose path is not filtered.
    passed_through: AtomicU64,
    /// Filtered requests admitted immediately.
    admitted: AtomicU64,
    /// Filtered requests that had to wait.
    throttled: AtomicU64,
    /// Sum of all imposed delays.
    total_delay_ms: AtomicU64,
}

/// Point-in-time copy of the gate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GateSnapshot {
    pub passed_through: u64,
    pub admitted: u64,
    pub throttled: u64,
    pub total_delay_ms: u64,
}

impl GateStats {
    pub fn record_pass_through(&self) {
        self.passed_through.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decision(&self, decision: &ThrottlingDecision) {
        if decision.is_throttled() {
            self.throttled.fetch_add(1, Ordering::Relaxed);
            self.total_delay_ms
                .fetch_add(decision.delay_millis, Ordering::Relaxed);
        } else {
            self.admitted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            passed_through: self.passed_through.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            total_delay_ms: self.total_delay_ms.load(Ordering::Relaxed),
        }
    }
}
