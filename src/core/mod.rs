//! Core pipeline types

pub mod config;
pub mod dispatch;
pub mod error;
pub mod level;
pub mod lifecycle;
pub mod metrics;
pub mod record;

pub use config::{RelayConfig, RelayMode, ScopeLevels, DEFAULT_QUEUE_CAPACITY};
pub use dispatch::ScopedLogger;
pub use error::{RelayError, Result};
pub use level::{LogLevel, WARNING_THRESHOLD};
pub use lifecycle::Relay;
pub use metrics::PipelineMetrics;
pub use record::{validate_scope, ChannelItem, LogRecord, MAX_SCOPE_LEN};
