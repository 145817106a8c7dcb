//! Load sources — where the live load percentage comes from.

use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// Errors produced while sampling load.
#[derive(Debug, Error)]
pub enum LoadSampleError {
    #[error("failed to read load sample: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed load sample: {0}")]
    Malformed(String),
}

/// Supplies the current load as a percentage in `0..=100`.
pub trait LoadSource: Send + Sync {
    fn current_load_percent(&self) -> Result<u8, LoadSampleError>;
}

impl<F> LoadSource for F
where
    F: Fn() -> Result<u8, LoadSampleError> + Send + Sync,
{
    fn current_load_percent(&self) -> Result<u8, LoadSampleError> {
        self()
    }
}

/// A source that always reports the same load.
#[derive(Debug, Clone, Copy)]
pub struct FixedLoadSource(pub u8);

impl LoadSource for FixedLoadSource {
    fn current_load_percent(&self) -> Result<u8, LoadSampleError> {
        Ok(self.0.min(100))
    }
}

/// Cumulative CPU counters from the aggregate `cpu` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    busy: u64,
    total: u64,
}

/// System-wide CPU utilization read from `/proc/stat`.
///
/// Each sample reports utilization since the previous sample. The first
/// sample has nothing to diff against and reports the average since boot.
pub struct ProcStatLoadSource {
    path: PathBuf,
    previous: Mutex<Option<CpuTimes>>,
}

impl ProcStatLoadSource {
    pub fn new() -> Self {
        Self::with_path("/proc/stat")
    }

    /// Read from an alternate stat file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            previous: Mutex::new(None),
        }
    }
}

impl Default for ProcStatLoadSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSource for ProcStatLoadSource {
    fn current_load_percent(&self) -> Result<u8, LoadSampleError> {
        let content = std::fs::read_to_string(&self.path)?;
        let current = parse_cpu_line(&content)?;

        let mut previous = self.previous.lock().unwrap_or_else(|e| e.into_inner());
        let load = match *previous {
            Some(prev) if current.total > prev.total && current.busy >= prev.busy => {
                percent(current.busy - prev.busy, current.total - prev.total)
            }
            _ => percent(current.busy, current.total),
        };
        *previous = Some(current);

        debug!(load, "sampled cpu utilization");
        Ok(load)
    }
}

fn percent(busy: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((busy as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Parse the aggregate `cpu` line of `/proc/stat`.
///
/// Fields: user nice system idle iowait irq softirq steal [guest guest_nice].
/// Guest time is already folded into user/nice, so only the first eight
/// columns are summed. Idle time is `idle + iowait`.
fn parse_cpu_line(content: &str) -> Result<CpuTimes, LoadSampleError> {
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| LoadSampleError::Malformed("no aggregate cpu line".to_string()))?;

    let fields = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(|f| {
            f.parse::<u64>()
                .map_err(|_| LoadSampleError::Malformed(format!("bad cpu counter `{f}`")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if fields.len() < 4 {
        return Err(LoadSampleError::Malformed(format!(
            "expected at least 4 cpu counters, got {}",
            fields.len()
        )));
    }

    let total: u64 = fields.iter().sum();
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Ok(CpuTimes {
        busy: total - idle,
        total,
    })
}
