//! Resizable ring of admission timestamps.
//!
//! Slot `current_index` is the one the next admission overwrites. Slots
//! holding `UNIX_EPOCH` have never been used and are always available.

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRing {
    timestamps: Vec<SystemTime>,
    current_index: usize,
}

impl TimestampRing {
    /// A ring of `capacity` unused slots (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            timestamps: vec![UNIX_EPOCH; capacity.max(1)],
            current_index: 0,
        }
    }

    /// Rebuild a ring from raw parts. An empty vector becomes one unused slot.
    pub fn from_parts(mut timestamps: Vec<SystemTime>, current_index: usize) -> Self {
        if timestamps.is_empty() {
            timestamps.push(UNIX_EPOCH);
        }
        let current_index = current_index % timestamps.len();
        Self {
            timestamps,
            current_index,
        }
    }

    pub fn capacity(&self) -> usize {
        self.timestamps.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn timestamps(&self) -> &[SystemTime] {
        &self.timestamps
    }

    /// The timestamp the next admission would overwrite.
    pub fn next_slot(&self) -> SystemTime {
        self.timestamps[self.current_index]
    }

    /// Record an admission at `now` and advance to the next slot.
    pub fn claim(&mut self, now: SystemTime) {
        self.timestamps[self.current_index] = now;
        self.current_index = (self.current_index + 1) % self.timestamps.len();
    }

    /// Resize to `new_capacity` slots, keeping the most recent history.
    ///
    /// Shrinking keeps the newest timestamps, newest first, and restarts
    /// writing at slot 0. Growing keeps every timestamp in place relative to
    /// its neighbours and inserts unused slots at the write position, so the
    /// next admissions land in the new capacity.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(1);
        let old_capacity = self.timestamps.len();

        if new_capacity < old_capacity {
            let mut kept = self.timestamps.clone();
            kept.sort_by(|a, b| b.cmp(a));
            kept.truncate(new_capacity);
            self.timestamps = kept;
            self.current_index = 0;
        } else if new_capacity > old_capacity {
            let added = new_capacity - old_capacity;
            let mut grown = Vec::with_capacity(new_capacity);
            grown.extend_from_slice(&self.timestamps[..self.current_index]);
            grown.extend(std::iter::repeat_n(UNIX_EPOCH, added));
            grown.extend_from_slice(&self.timestamps[self.current_index..]);
            self.timestamps = grown;
        }
    }
}
