use std::path::Path;

use loadgate_core::LoadgateConfig;
use loadgate_estimator::{CpuLoadEstimator, LoadEstimator};

pub fn estimate(config_path: &Path, load: Option<u8>) -> anyhow::Result<()> {
    let config = LoadgateConfig::from_file(config_path)?;
    println!("{}", report(&config, load)?);
    Ok(())
}

fn report(config: &LoadgateConfig, load: Option<u8>) -> anyhow::Result<String> {
    let estimator = CpuLoadEstimator::from_config(config)?;
    let throttling = estimator.config();
    let header = format!(
        "baseline={} target_load={}% min_capacity={}",
        throttling.baseline_capacity(),
        throttling.target_load(),
        throttling.min_capacity()
    );

    let detail = match load {
        Some(load) => format!(
            "load={}% capacity={}",
            load.min(100),
            estimator.capacity_for(load)
        ),
        None => format!(
            "source={:?} capacity={}",
            config.load_source(),
            estimator.estimate()
        ),
    };
    Ok(format!("{header}\n{detail}"))
}
