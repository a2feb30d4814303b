//! Logging macros for ergonomic log message formatting.
//!
//! The macros check the logger's thresholds *before* expanding the format
//! arguments, so a filtered call never formats anything.
//!
//! # Examples
//!
//! ```no_run
//! use log_relay::prelude::*;
//! use log_relay::info;
//! use std::sync::Arc;
//!
//! let relay = Arc::new(Relay::new());
//! relay.init(RelayConfig::direct("/tmp/session")).unwrap();
//! let logger = relay.logger("server").unwrap();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message with automatic formatting, skipping the `format!` call
/// entirely when `$level` clears neither threshold.
///
/// # Examples
///
/// ```no_run
/// # use log_relay::prelude::*;
/// # use std::sync::Arc;
/// # let relay = Arc::new(Relay::new());
/// # relay.init(RelayConfig::direct("/tmp/session")).unwrap();
/// # let logger = relay.logger("app").unwrap();
/// use log_relay::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        if $logger.enabled($level) {
            $logger.log($level, format!($($arg)+));
        }
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
