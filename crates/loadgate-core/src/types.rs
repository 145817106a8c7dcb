//! Shared types used across loadgate crates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Length of the sliding admission window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Validated throttling parameters. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThrottlingConfiguration {
    baseline_capacity: usize,
    target_load: u8,
    min_capacity: usize,
}

impl ThrottlingConfiguration {
    /// Build a configuration with the default protective floor of 1.
    pub fn new(baseline_capacity: usize, target_load: u32) -> ConfigResult<Self> {
        Self::with_floor(baseline_capacity, target_load, 1)
    }

    /// Build a configuration with an explicit protective floor.
    pub fn with_floor(
        baseline_capacity: usize,
        target_load: u32,
        min_capacity: usize,
    ) -> ConfigResult<Self> {
        if baseline_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if target_load > 100 {
            return Err(ConfigError::TargetLoadOutOfRange(target_load));
        }
        if min_capacity == 0 || min_capacity > baseline_capacity {
            return Err(ConfigError::FloorOutOfRange {
                floor: min_capacity,
                baseline: baseline_capacity,
            });
        }
        Ok(Self {
            baseline_capacity,
            target_load: target_load as u8,
            min_capacity,
        })
    }

    /// Slots granted while load is below target.
    pub fn baseline_capacity(&self) -> usize {
        self.baseline_capacity
    }

    /// Load percentage at which capacity collapses to the floor.
    pub fn target_load(&self) -> u8 {
        self.target_load
    }

    /// Protective floor used under pressure or when sampling fails.
    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }
}

/// The two outcomes of an admission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionState {
    Throttle,
    NoThrottle,
}

/// Result of a single `evaluate_throttling` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottlingDecision {
    pub state: DecisionState,
    /// Zero for `NoThrottle`; otherwise milliseconds until the slot frees up.
    pub delay_millis: u64,
}

impl ThrottlingDecision {
    pub fn no_throttle() -> Self {
        Self {
            state: DecisionState::NoThrottle,
            delay_millis: 0,
        }
    }

    pub fn throttle(delay_millis: u64) -> Self {
        Self {
            state: DecisionState::Throttle,
            delay_millis,
        }
    }

    pub fn is_throttled(&self) -> bool {
        self.state == DecisionState::Throttle
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            ThrottlingConfiguration::new(0, 50),
            Err(ConfigError::ZeroCapacity)
        ));
    }

    #[test]
    fn rejects_target_above_100() {
        assert!(matches!(
            ThrottlingConfiguration::new(10, 101),
            Err(ConfigError::TargetLoadOutOfRange(101))
        ));
    }

    #[test]
    fn rejects_floor_above_baseline() {
        assert!(matches!(
            ThrottlingConfiguration::with_floor(10, 50, 11),
            Err(ConfigError::FloorOutOfRange { floor: 11, baseline: 10 })
        ));
        assert!(ThrottlingConfiguration::with_floor(10, 50, 0).is_err());
    }

    #[test]
    fn default_floor_is_one() {
        let config = ThrottlingConfiguration::new(600, 75).unwrap();
        assert_eq!(config.baseline_capacity(), 600);
        assert_eq!(config.target_load(), 75);
        assert_eq!(config.min_capacity(), 1);
    }

    #[test]
    fn decision_helpers() {
        let pass = ThrottlingDecision::no_throttle();
        assert!(!pass.is_throttled());
        assert_eq!(pass.delay(), Duration::ZERO);

        let wait = ThrottlingDecision::throttle(1_500);
        assert!(wait.is_throttled());
        assert_eq!(wait.delay(), Duration::from_millis(1_500));
    }
}
