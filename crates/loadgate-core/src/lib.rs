pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LoadSourceKind, LoadgateConfig};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
