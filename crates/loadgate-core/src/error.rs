//! Error types for loadgate configuration and activation.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
///
/// All of these surface at activation time. Nothing in the request path
/// returns a `ConfigError`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("baseline capacity must be at least 1")]
    ZeroCapacity,

    #[error("target load must be within 0..=100, got {0}")]
    TargetLoadOutOfRange(u32),

    #[error("minimum capacity {floor} must be within 1..={baseline}")]
    FloorOutOfRange { floor: usize, baseline: usize },

    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("fixed load must be within 0..=100, got {0}")]
    FixedLoadOutOfRange(u8),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}
