//! Request throttler — the admission gate.
//!
//! Requests whose path matches a filtered pattern are run through the
//! shared `ThrottlingState`. A `Throttle` decision delays the caller once
//! for the reported time and then lets it proceed; nothing is ever
//! rejected here. Unmatched requests go straight through without touching
//! the state.

use std::future::Future;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use loadgate_core::{Clock, ConfigResult, LoadgateConfig, ThrottlingDecision};
use loadgate_estimator::CpuLoadEstimator;
use loadgate_throttle::ThrottlingState;

use crate::matcher::PathMatcher;
use crate::stats::{GateSnapshot, GateStats};

pub struct RequestThrottler {
    paths: RwLock<PathMatcher>,
    state: Arc<ThrottlingState>,
    stats: GateStats,
}

impl RequestThrottler {
    pub fn new(paths: PathMatcher, state: Arc<ThrottlingState>) -> Self {
        Self {
            paths: RwLock::new(paths),
            state,
            stats: GateStats::default(),
        }
    }

    /// Activate a gate from configuration.
    ///
    /// Every config problem, including malformed path patterns, is reported
    /// here rather than during request processing.
    pub fn from_config(config: &LoadgateConfig, clock: Arc<dyn Clock>) -> ConfigResult<Self> {
        let throttling = config.throttling_configuration()?;
        let paths = PathMatcher::new(config.filtered_paths())?;
        let estimator = CpuLoadEstimator::from_config(config)?;
        let state = Arc::new(ThrottlingState::new(Arc::new(estimator), clock));

        info!(
            patterns = paths.patterns().len(),
            baseline = throttling.baseline_capacity(),
            target_load = throttling.target_load(),
            source = ?config.load_source(),
            "request throttler activated"
        );
        Ok(Self::new(paths, state))
    }

    /// True iff `path` is subject to throttling.
    pub fn needs_filtering(&self, path: &str) -> bool {
        self.paths
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .matches(path)
    }

    /// Evaluate `path` without waiting. `None` means it is not filtered.
    pub fn decide(&self, path: &str) -> Option<ThrottlingDecision> {
        if !self.needs_filtering(path) {
            self.stats.record_pass_through();
            return None;
        }
        let decision = self.state.evaluate_throttling();
        self.stats.record_decision(&decision);
        Some(decision)
    }

    /// Run `proceed` for `path`, first sleeping if the request is throttled.
    pub async fn admit<F, Fut>(&self, path: &str, proceed: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        if let Some(decision) = self.decide(path)
            && decision.is_throttled()
        {
            debug!(path, delay_ms = decision.delay_millis, "throttling request");
            tokio::time::sleep(decision.delay()).await;
        }
        proceed().await
    }

    /// Blocking variant of [`admit`](Self::admit) for synchronous callers.
    pub fn admit_blocking<F, T>(&self, path: &str, proceed: F) -> T
    where
        F: FnOnce() -> T,
    {
        if let Some(decision) = self.decide(path)
            && decision.is_throttled()
        {
            debug!(path, delay_ms = decision.delay_millis, "throttling request");
            std::thread::sleep(decision.delay());
        }
        proceed()
    }

    /// Swap the filtered path set. The throttling history is kept.
    ///
    /// On error the previous patterns stay in effect.
    pub fn set_filtered_paths<S: AsRef<str>>(&self, patterns: &[S]) -> ConfigResult<()> {
        let matcher = PathMatcher::new(patterns)?;
        info!(patterns = matcher.patterns().len(), "filtered paths updated");
        *self.paths.write().unwrap_or_else(|e| e.into_inner()) = matcher;
        Ok(())
    }

    pub fn filtered_paths(&self) -> Vec<String> {
        self.paths
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .patterns()
            .to_vec()
    }

    pub fn state(&self) -> &Arc<ThrottlingState> {
        &self.state
    }

    pub fn stats(&self) -> GateSnapshot {
        self.stats.snapshot()
    }
}
