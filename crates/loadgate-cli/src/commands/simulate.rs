use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use loadgate_core::clock::elapsed_since;
use loadgate_core::{Clock, DecisionState, LoadgateConfig, ManualClock};
use loadgate_estimator::{CpuLoadEstimator, FixedLoadSource, LoadEstimator};
use loadgate_throttle::ThrottlingState;

/// Simulated start time. Any instant well past the epoch works.
const SIMULATION_START_SECS: u64 = 1_700_000_000;

/// One simulated evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStep {
    pub request: usize,
    pub at_ms: u64,
    pub capacity: usize,
    pub state: DecisionState,
    pub delay_ms: u64,
}

pub fn simulate(
    config_path: &Path,
    requests: usize,
    load: Option<u8>,
    interval_ms: u64,
    format: &str,
) -> anyhow::Result<()> {
    let config = LoadgateConfig::from_file(config_path)?;
    let estimator = match load {
        Some(load) => CpuLoadEstimator::new(
            Arc::new(FixedLoadSource(load)),
            config.throttling_configuration()?,
            Duration::ZERO,
        ),
        None => CpuLoadEstimator::from_config(&config)?,
    };

    let steps = run_simulation(Arc::new(estimator), requests, Duration::from_millis(interval_ms));

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&steps)?),
        _ => {
            for step in &steps {
                println!(
                    "#{:<5} t+{:>8}ms  capacity={:<6} {:?}{}",
                    step.request,
                    step.at_ms,
                    step.capacity,
                    step.state,
                    if step.delay_ms > 0 {
                        format!(" (wait {}ms)", step.delay_ms)
                    } else {
                        String::new()
                    }
                );
            }
            let throttled = steps
                .iter()
                .filter(|s| s.state == DecisionState::Throttle)
                .count();
            println!(
                "{} requests: {} admitted, {} throttled",
                steps.len(),
                steps.len() - throttled,
                throttled
            );
        }
    }
    Ok(())
}

/// Evaluate `requests` times, advancing a simulated clock by `interval`
/// after each one.
pub fn run_simulation(
    estimator: Arc<dyn LoadEstimator>,
    requests: usize,
    interval: Duration,
) -> Vec<SimulationStep> {
    let clock = Arc::new(ManualClock::at_epoch_secs(SIMULATION_START_SECS));
    let start: SystemTime = clock.now();
    let state = ThrottlingState::new(estimator, clock.clone());

    (0..requests)
        .map(|request| {
            let decision = state.evaluate_throttling();
            let step = SimulationStep {
                request,
                at_ms: elapsed_since(clock.now(), start).as_millis() as u64,
                capacity: state.capacity(),
                state: decision.state,
                delay_ms: decision.delay_millis,
            };
            clock.advance(interval);
            step
        })
        .collect()
}
