//! Throttling state — the admission decision engine.
//!
//! One `ThrottlingState` protects one scope. It owns a ring of the most
//! recent admission timestamps sized to the estimator's capacity, and on
//! every evaluation either claims the oldest slot or reports how long
//! until that slot frees up.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::UNIX_EPOCH;

use tracing::{debug, trace};

use loadgate_core::clock::elapsed_since;
use loadgate_core::{Clock, ThrottlingDecision, WINDOW};
use loadgate_estimator::LoadEstimator;

use crate::ring::TimestampRing;

pub struct ThrottlingState {
    estimator: Arc<dyn LoadEstimator>,
    clock: Arc<dyn Clock>,
    ring: Mutex<TimestampRing>,
}

impl ThrottlingState {
    /// Create a state whose ring starts at the estimator's current capacity.
    pub fn new(estimator: Arc<dyn LoadEstimator>, clock: Arc<dyn Clock>) -> Self {
        let capacity = estimator.estimate();
        debug!(capacity, "throttling state created");
        Self {
            estimator,
            clock,
            ring: Mutex::new(TimestampRing::new(capacity)),
        }
    }

    /// Decide whether one unit of work may proceed now.
    ///
    /// Never blocks beyond the ring lock. A `Throttle` decision leaves the
    /// ring untouched.
    pub fn evaluate_throttling(&self) -> ThrottlingDecision {
        let mut ring = self.lock();

        let capacity = self.estimator.estimate().max(1);
        if capacity != ring.capacity() {
            debug!(from = ring.capacity(), to = capacity, "resizing admission ring");
            ring.resize(capacity);
        }

        let now = self.clock.now();
        let slot = ring.next_slot();
        let elapsed = elapsed_since(now, slot);

        if slot == UNIX_EPOCH || elapsed >= WINDOW {
            ring.claim(now);
            trace!(capacity, "admitted");
            return ThrottlingDecision::no_throttle();
        }

        let remaining = WINDOW - elapsed;
        let delay_millis = remaining.as_nanos().div_ceil(1_000_000) as u64;
        trace!(capacity, delay_millis, "throttled");
        ThrottlingDecision::throttle(delay_millis)
    }

    /// Ring length as of the last evaluation.
    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Copy of the ring for inspection.
    pub fn snapshot(&self) -> TimestampRing {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, TimestampRing> {
        self.ring.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use loadgate_core::{DecisionState, ManualClock};
    use loadgate_estimator::FixedLoadEstimator;

    const T0: u64 = 1_700_000_000;

    fn fixed_state(capacity: usize) -> (ThrottlingState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch_secs(T0));
        let state = ThrottlingState::new(
            Arc::new(FixedLoadEstimator::new(capacity)),
            clock.clone(),
        );
        (state, clock)
    }

    fn adjustable_state(initial: usize) -> (ThrottlingState, Arc<ManualClock>, Arc<AtomicUsize>) {
        let clock = Arc::new(ManualClock::at_epoch_secs(T0));
        let capacity = Arc::new(AtomicUsize::new(initial));
        let reader = capacity.clone();
        let state = ThrottlingState::new(
            Arc::new(move || reader.load(Ordering::SeqCst)),
            clock.clone(),
        );
        (state, clock, capacity)
    }

    #[test]
    fn minute_window_scenario() {
        let (state, clock) = fixed_state(10);

        for _ in 0..10 {
            assert_eq!(state.evaluate_throttling(), ThrottlingDecision::no_throttle());
        }

        let eleventh = state.evaluate_throttling();
        assert_eq!(eleventh.state, DecisionState::Throttle);
        assert_eq!(eleventh.delay_millis, 60_000);

        clock.advance(Duration::from_secs(59));
        assert_eq!(state.evaluate_throttling(), ThrottlingDecision::throttle(1_000));

        clock.advance(Duration::from_secs(2));
        assert_eq!(state.evaluate_throttling(), ThrottlingDecision::no_throttle());
    }

    #[test]
    fn throttle_does_not_mutate_ring() {
        let (state, _clock) = fixed_state(1);
        state.evaluate_throttling();
        let before = state.snapshot();

        assert!(state.evaluate_throttling().is_throttled());
        assert!(state.evaluate_throttling().is_throttled());
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn delay_counts_down_from_slot_time() {
        let (state, clock) = fixed_state(1);
        state.evaluate_throttling();

        clock.advance(Duration::from_millis(12_345));
        assert_eq!(state.evaluate_throttling().delay_millis, 60_000 - 12_345);
    }

    #[test]
    fn sub_millisecond_remainder_rounds_up() {
        let (state, clock) = fixed_state(1);
        state.evaluate_throttling();

        clock.advance(Duration::from_micros(59_999_500));
        assert_eq!(state.evaluate_throttling().delay_millis, 1);
    }

    #[test]
    fn slot_frees_at_exactly_sixty_seconds() {
        let (state, clock) = fixed_state(1);
        state.evaluate_throttling();

        clock.advance(WINDOW);
        assert!(!state.evaluate_throttling().is_throttled());
    }

    #[test]
    fn clock_going_backwards_is_conservative() {
        let (state, clock) = fixed_state(1);
        state.evaluate_throttling();

        clock.set(UNIX_EPOCH + Duration::from_secs(T0 - 10));
        assert_eq!(state.evaluate_throttling(), ThrottlingDecision::throttle(60_000));
    }

    #[test]
    fn growing_capacity_admits_into_new_slots() {
        let (state, _clock, capacity) = adjustable_state(2);
        assert!(!state.evaluate_throttling().is_throttled());
        assert!(!state.evaluate_throttling().is_throttled());
        assert!(state.evaluate_throttling().is_throttled());

        capacity.store(4, Ordering::SeqCst);
        assert!(!state.evaluate_throttling().is_throttled());
        assert!(!state.evaluate_throttling().is_throttled());
        assert!(state.evaluate_throttling().is_throttled());
        assert_eq!(state.capacity(), 4);
    }

    #[test]
    fn shrinking_capacity_keeps_newest_history() {
        let (state, clock, capacity) = adjustable_state(10);
        for _ in 0..5 {
            state.evaluate_throttling();
        }
        clock.advance(Duration::from_secs(2));
        for _ in 0..5 {
            state.evaluate_throttling();
        }

        capacity.store(8, Ordering::SeqCst);
        let decision = state.evaluate_throttling();

        let ring = state.snapshot();
        let t0 = UNIX_EPOCH + Duration::from_secs(T0);
        let t2 = t0 + Duration::from_secs(2);
        assert_eq!(ring.capacity(), 8);
        assert_eq!(ring.current_index(), 0);
        assert_eq!(ring.timestamps(), &[t2, t2, t2, t2, t2, t0, t0, t0]);
        // Slot 0 holds the newest admission, made just now.
        assert_eq!(decision, ThrottlingDecision::throttle(60_000));
    }

    /// Drive 600 evaluations 500ms apart while `capacity_at(step)` changes,
    /// returning each admission's time and the capacity it was admitted under.
    fn drive(capacity_at: impl Fn(u64) -> usize) -> Vec<(std::time::SystemTime, usize)> {
        let (state, clock, capacity) = adjustable_state(capacity_at(0));
        let mut admitted = Vec::new();
        for step in 0..600u64 {
            capacity.store(capacity_at(step), Ordering::SeqCst);
            if !state.evaluate_throttling().is_throttled() {
                admitted.push((clock.now(), state.capacity()));
            }
            clock.advance(Duration::from_millis(500));
        }
        admitted
    }

    fn assert_window_bound(admitted: &[(std::time::SystemTime, usize)]) {
        for (i, (at, cap)) in admitted.iter().enumerate() {
            let in_window = admitted[..=i]
                .iter()
                .filter(|(t, _)| elapsed_since(*at, *t) < WINDOW)
                .count();
            assert!(in_window <= *cap, "{in_window} admissions in window with capacity {cap}");
        }
    }

    #[test]
    fn window_bound_holds_while_growing() {
        let admitted = drive(|step| 1 + (step / 50) as usize);
        assert!(!admitted.is_empty());
        assert_window_bound(&admitted);
    }

    #[test]
    fn window_bound_holds_while_shrinking() {
        let admitted = drive(|step| 12usize.saturating_sub((step / 50) as usize).max(1));
        assert!(!admitted.is_empty());
        assert_window_bound(&admitted);
    }

    #[test]
    fn concurrent_callers_never_over_admit() {
        let (state, _clock) = fixed_state(50);
        let state = Arc::new(state);
        let admitted = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|s| {
            for _ in 0..8 {
                let state = state.clone();
                let admitted = admitted.clone();
                s.spawn(move || {
                    for _ in 0..100 {
                        if !state.evaluate_throttling().is_throttled() {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(admitted.load(Ordering::SeqCst), 50);
    }

    /// Evaluate from several threads while another walks the estimator
    /// through `schedule` once. Returns how many evaluations were admitted.
    /// The clock never moves, so only never-used slots can be claimed.
    fn admitted_under_contended_resizes(schedule: &[usize]) -> usize {
        let (state, _clock, capacity) = adjustable_state(schedule[0]);
        let admitted = AtomicUsize::new(0);

        std::thread::scope(|s| {
            s.spawn(|| {
                for &next in schedule {
                    capacity.store(next, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_micros(200));
                }
            });
            for _ in 0..6 {
                s.spawn(|| {
                    for _ in 0..200 {
                        if !state.evaluate_throttling().is_throttled() {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                        let ring = state.snapshot();
                        assert!(
                            schedule.contains(&ring.capacity()),
                            "ring capacity {} was never estimated",
                            ring.capacity()
                        );
                        assert_eq!(ring.timestamps().len(), ring.capacity());
                        assert!(ring.current_index() < ring.capacity());
                    }
                });
            }
        });

        admitted.load(Ordering::SeqCst)
    }

    #[test]
    fn growing_under_contention_stays_within_largest_capacity() {
        let schedule = [2, 5, 9, 14, 20, 27, 35];
        let admitted = admitted_under_contended_resizes(&schedule);
        assert!(admitted >= 2, "only {admitted} admitted");
        assert!(admitted <= 35, "{admitted} admitted with at most 35 slots");
    }

    #[test]
    fn shrinking_under_contention_stays_within_largest_capacity() {
        let schedule = [35, 27, 20, 14, 9, 5, 2];
        let admitted = admitted_under_contended_resizes(&schedule);
        assert!(admitted >= 2, "only {admitted} admitted");
        assert!(admitted <= 35, "{admitted} admitted with at most 35 slots");
    }
}
