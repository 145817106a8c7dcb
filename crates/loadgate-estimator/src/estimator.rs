//! Load estimators — turn a load sample into an admission capacity.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use loadgate_core::{ConfigResult, LoadSourceKind, LoadgateConfig, ThrottlingConfiguration};

use crate::source::{FixedLoadSource, LoadSource, ProcStatLoadSource};

/// Produces the number of admission slots currently permitted.
///
/// Implementations never block for long and never fail: a broken load
/// source must degrade to a conservative capacity, not an error.
pub trait LoadEstimator: Send + Sync {
    fn estimate(&self) -> usize;
}

impl<F> LoadEstimator for F
where
    F: Fn() -> usize + Send + Sync,
{
    fn estimate(&self) -> usize {
        self().max(1)
    }
}

/// Capacity for a given load.
///
/// At or above `target_load` the system is under pressure and capacity
/// drops to `floor`. Below it, `baseline` is scaled by the headroom ratio
/// `(100 - current) / (100 - target)`, truncated, and capped at `baseline`.
/// The result is never below `floor`, and `floor` is never below 1.
pub fn proportional_capacity(
    current_load: u8,
    target_load: u8,
    baseline: usize,
    floor: usize,
) -> usize {
    let baseline = baseline.max(1);
    let floor = floor.clamp(1, baseline);
    let current_load = current_load.min(100);

    if current_load >= target_load {
        return floor;
    }

    let headroom = f64::from(100 - current_load) / f64::from(100 - target_load.min(100));
    let scaled = (baseline as f64 * headroom).trunc();
    let capped = if scaled.is_finite() && scaled < baseline as f64 {
        scaled as usize
    } else {
        baseline
    };
    capped.max(floor)
}

/// Always reports the same capacity.
#[derive(Debug, Clone, Copy)]
pub struct FixedLoadEstimator {
    capacity: usize,
}

impl FixedLoadEstimator {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }
}

impl LoadEstimator for FixedLoadEstimator {
    fn estimate(&self) -> usize {
        self.capacity
    }
}

/// Last sample taken from the load source. `None` means sampling failed.
struct CachedSample {
    load: Option<u8>,
    taken_at: Instant,
}

/// Capacity driven by live CPU load.
///
/// Samples are cached for `sample_interval` so the request path does not
/// hit the load source on every evaluation.
pub struct CpuLoadEstimator {
    source: Arc<dyn LoadSource>,
    config: ThrottlingConfiguration,
    sample_interval: Duration,
    cache: Mutex<Option<CachedSample>>,
}

impl CpuLoadEstimator {
    pub fn new(
        source: Arc<dyn LoadSource>,
        config: ThrottlingConfiguration,
        sample_interval: Duration,
    ) -> Self {
        Self {
            source,
            config,
            sample_interval,
            cache: Mutex::new(None),
        }
    }

    /// Build the estimator and load source described by `config`.
    pub fn from_config(config: &LoadgateConfig) -> ConfigResult<Self> {
        let source: Arc<dyn LoadSource> = match config.load_source() {
            LoadSourceKind::ProcStat => Arc::new(ProcStatLoadSource::new()),
            LoadSourceKind::Fixed => Arc::new(FixedLoadSource(config.fixed_load())),
        };
        Ok(Self::new(
            source,
            config.throttling_configuration()?,
            config.sample_interval()?,
        ))
    }

    pub fn config(&self) -> &ThrottlingConfiguration {
        &self.config
    }

    /// Capacity for an explicit load value, bypassing the source.
    pub fn capacity_for(&self, load: u8) -> usize {
        proportional_capacity(
            load,
            self.config.target_load(),
            self.config.baseline_capacity(),
            self.config.min_capacity(),
        )
    }

    fn sample(&self) -> Option<u8> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.as_ref()
            && cached.taken_at.elapsed() < self.sample_interval
        {
            return cached.load;
        }

        let load = match self.source.current_load_percent() {
            Ok(load) => Some(load),
            Err(e) => {
                warn!(error = %e, "load sampling failed, falling back to minimum capacity");
                None
            }
        };
        *cache = Some(CachedSample {
            load,
            taken_at: Instant::now(),
        });
        load
    }
}

impl LoadEstimator for CpuLoadEstimator {
    fn estimate(&self) -> usize {
        match self.sample() {
            Some(load) => {
                let capacity = self.capacity_for(load);
                debug!(load, capacity, "estimated capacity");
                capacity
            }
            None => self.config.min_capacity(),
        }
    }
}
