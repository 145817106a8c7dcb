//! loadgate.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::ThrottlingConfiguration;

const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadgateConfig {
    pub throttling: ThrottlingSection,
    pub estimator: Option<EstimatorSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottlingSection {
    pub baseline_capacity: usize,
    pub target_load: u32,
    pub min_capacity: Option<usize>,
    #[serde(default)]
    pub filtered_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorSection {
    pub source: Option<LoadSourceKind>,
    pub fixed_load: Option<u8>,
    pub sample_interval: Option<String>,
}

/// Where live load samples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadSourceKind {
    /// Aggregate CPU utilization from `/proc/stat`.
    #[default]
    ProcStat,
    /// A constant load taken from `fixed_load`.
    Fixed,
}

impl LoadgateConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: LoadgateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field that can be checked without compiling patterns.
    pub fn validate(&self) -> ConfigResult<()> {
        self.throttling_configuration()?;
        self.sample_interval()?;
        if let Some(load) = self.estimator.as_ref().and_then(|e| e.fixed_load)
            && load > 100
        {
            return Err(ConfigError::FixedLoadOutOfRange(load));
        }
        Ok(())
    }

    /// The validated, immutable throttling parameters.
    pub fn throttling_configuration(&self) -> ConfigResult<ThrottlingConfiguration> {
        let t = &self.throttling;
        ThrottlingConfiguration::with_floor(
            t.baseline_capacity,
            t.target_load,
            t.min_capacity.unwrap_or(1),
        )
    }

    pub fn filtered_paths(&self) -> &[String] {
        &self.throttling.filtered_paths
    }

    pub fn load_source(&self) -> LoadSourceKind {
        self.estimator
            .as_ref()
            .and_then(|e| e.source)
            .unwrap_or_default()
    }

    /// Load percentage reported by the fixed source.
    pub fn fixed_load(&self) -> u8 {
        self.estimator
            .as_ref()
            .and_then(|e| e.fixed_load)
            .unwrap_or(0)
    }

    /// How long a load sample stays fresh before being re-read.
    pub fn sample_interval(&self) -> ConfigResult<Duration> {
        match self.estimator.as_ref().and_then(|e| e.sample_interval.as_deref()) {
            Some(raw) => {
                parse_duration(raw).ok_or_else(|| ConfigError::InvalidDuration(raw.to_string()))
            }
            None => Ok(DEFAULT_SAMPLE_INTERVAL),
        }
    }

    /// Scaffold a loadgate.toml that throttles nothing until paths are added.
    pub fn scaffold() -> Self {
        LoadgateConfig {
            throttling: ThrottlingSection {
                baseline_capacity: 600,
                target_load: 75,
                min_capacity: Some(1),
                filtered_paths: Vec::new(),
            },
            estimator: Some(EstimatorSection {
                source: Some(LoadSourceKind::ProcStat),
                fixed_load: None,
                sample_interval: Some("1s".to_string()),
            }),
        }
    }
}

/// Parse a duration like "500ms", "5s", "2m", or a bare number of seconds.
///
/// Returns `None` for malformed input and for values that overflow.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, millis_per_unit) = if let Some(n) = raw.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = raw.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = raw.strip_suffix('m') {
        (n, 60_000)
    } else {
        (raw, 1_000)
    };
    let value: u64 = digits.parse().ok()?;
    value.checked_mul(millis_per_unit).map(Duration::from_millis)
}
