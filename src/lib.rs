//! # Log Relay
//!
//! A process-wide logging pipeline that decouples record creation from
//! record persistence: callers enqueue pre-rendered lines, a single
//! background consumer writes severity-routed files, and worker processes
//! can ship their records to a central collector instead of writing files
//! themselves.
//!
//! ## Features
//!
//! - **Asynchronous writes**: callers never block on file I/O
//! - **Early filtering**: below-threshold calls cost one comparison
//! - **Cross-process shipping**: one collector, many workers, one queue
//! - **Orderly shutdown**: bounded drain, value-based sentinel, signal net

pub mod channel;
pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::channel::{QueueReceiver, QueueSender, WriteEngine};
    pub use crate::core::{
        validate_scope, ChannelItem, LogLevel, LogRecord, PipelineMetrics, Relay, RelayConfig,
        RelayError, RelayMode, Result, ScopeLevels, ScopedLogger, DEFAULT_QUEUE_CAPACITY,
        MAX_SCOPE_LEN, WARNING_THRESHOLD,
    };
    pub use crate::sinks::{ConsoleSink, FileSink};
}

pub use crate::channel::{QueueReceiver, QueueSender, WriteEngine};
pub use crate::core::{
    validate_scope, ChannelItem, LogLevel, LogRecord, PipelineMetrics, Relay, RelayConfig,
    RelayError, RelayMode, Result, ScopeLevels, ScopedLogger, DEFAULT_QUEUE_CAPACITY,
    MAX_SCOPE_LEN, WARNING_THRESHOLD,
};
pub use crate::sinks::{ConsoleSink, FileSink};
