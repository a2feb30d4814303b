//! Per-call dispatch: threshold filtering and routing
//!
//! A [`ScopedLogger`] decides in O(1), before any formatting or error
//! introspection, whether a call produces console output, file output,
//! both, or nothing. Below both thresholds it returns with zero side
//! effects; the logging macros consult [`ScopedLogger::enabled`] first so
//! even the `format!` never runs on the filtered path.

use super::level::LogLevel;
use super::record::LogRecord;
use crate::channel::RecordRoute;
use crate::sinks::ConsoleSink;
use std::error::Error;
use std::sync::Arc;

/// Render an error and its source chain into the exception block persisted
/// beneath the record line.
fn render_error_chain(err: &(dyn Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(c) = cause {
        out.push_str("\ncaused by: ");
        out.push_str(&c.to_string());
        cause = c.source();
    }
    out
}

/// A cheap, cloneable handle for emitting records under one scope.
///
/// Thresholds are fixed at acquisition time (scope overrides fall back to
/// the global defaults), so the hot path touches no shared mutable state.
#[derive(Clone)]
pub struct ScopedLogger {
    scope: String,
    console_level: LogLevel,
    file_level: LogLevel,
    route: Arc<RecordRoute>,
    console: ConsoleSink,
}

impl ScopedLogger {
    pub(crate) fn new(
        scope: impl Into<String>,
        console_level: LogLevel,
        file_level: LogLevel,
        route: Arc<RecordRoute>,
        console: ConsoleSink,
    ) -> Self {
        Self {
            scope: scope.into(),
            console_level,
            file_level,
            route,
            console,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn console_level(&self) -> LogLevel {
        self.console_level
    }

    pub fn file_level(&self) -> LogLevel {
        self.file_level
    }

    /// Whether `level` clears at least one of the two thresholds. The
    /// macros call this before formatting anything.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.console_level || level >= self.file_level
    }

    /// Emit one pre-rendered line.
    pub fn log(&self, level: LogLevel, rendered: impl Into<String>) {
        self.dispatch(level, rendered.into(), None);
    }

    /// Emit one pre-rendered line with a causing error. The error chain is
    /// captured only when the record actually emits at Error severity or
    /// above; the filtered path never inspects `source`.
    pub fn log_with_source(
        &self,
        level: LogLevel,
        rendered: impl Into<String>,
        source: &(dyn Error + 'static),
    ) {
        self.dispatch(level, rendered.into(), Some(source));
    }

    fn dispatch(&self, level: LogLevel, rendered: String, source: Option<&(dyn Error + 'static)>) {
        let to_console = level >= self.console_level;
        let to_file = level >= self.file_level;
        if !to_console && !to_file {
            return;
        }

        let exception_text = match source {
            Some(err) if level >= LogLevel::Error => Some(render_error_chain(err)),
            _ => None,
        };

        if to_console {
            self.console.echo(level, &rendered, exception_text.as_deref());
        }
        if to_file {
            let mut record = LogRecord::new(rendered, level, self.scope.clone());
            if let Some(text) = exception_text {
                record = record.with_exception(text);
            }
            self.route.push(record);
        }
    }

    #[inline]
    pub fn trace(&self, rendered: impl Into<String>) {
        self.log(LogLevel::Trace, rendered);
    }

    #[inline]
    pub fn debug(&self, rendered: impl Into<String>) {
        self.log(LogLevel::Debug, rendered);
    }

    #[inline]
    pub fn info(&self, rendered: impl Into<String>) {
        self.log(LogLevel::Info, rendered);
    }

    #[inline]
    pub fn warn(&self, rendered: impl Into<String>) {
        self.log(LogLevel::Warn, rendered);
    }

    #[inline]
    pub fn error(&self, rendered: impl Into<String>) {
        self.log(LogLevel::Error, rendered);
    }

    #[inline]
    pub fn fatal(&self, rendered: impl Into<String>) {
        self.log(LogLevel::Fatal, rendered);
    }

    /// Error-severity shorthand carrying a causing error.
    pub fn error_with(&self, rendered: impl Into<String>, source: &(dyn Error + 'static)) {
        self.log_with_source(LogLevel::Error, rendered, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::WriteEngine;
    use crate::sinks::FileSink;
    use std::fmt;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct Inner;
    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection reset")
        }
    }
    impl Error for Inner {}

    #[derive(Debug)]
    struct Outer(Inner);
    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "request failed")
        }
    }
    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    fn direct_logger(
        dir: &TempDir,
        console_level: LogLevel,
        file_level: LogLevel,
    ) -> (ScopedLogger, Arc<WriteEngine>) {
        let engine = Arc::new(WriteEngine::new(100));
        engine.start(FileSink::new(dir.path()));
        let route = Arc::new(RecordRoute::Direct(Arc::clone(&engine)));
        let logger = ScopedLogger::new(
            "test",
            console_level,
            file_level,
            route,
            ConsoleSink::with_colors(false),
        );
        (logger, engine)
    }

    #[test]
    fn test_enabled_uses_lower_threshold() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let (logger, engine) = direct_logger(&dir, LogLevel::Warn, LogLevel::Info);
        assert!(!logger.enabled(LogLevel::Debug));
        assert!(logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Fatal));
        engine.shutdown();
    }

    #[test]
    fn test_filtered_call_reaches_no_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let (logger, engine) = direct_logger(&dir, LogLevel::Error, LogLevel::Error);
        logger.info("below both thresholds");
        engine.shutdown();

        let content = std::fs::read_to_string(dir.path().join("full.log")).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_error_chain_captured_on_emit_path() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let (logger, engine) = direct_logger(&dir, LogLevel::Fatal, LogLevel::Info);
        logger.error_with("request handler failed", &Outer(Inner));
        engine.shutdown();

        let content = std::fs::read_to_string(dir.path().join("full.log")).unwrap();
        assert!(content.contains("request handler failed"));
        assert!(content.contains("request failed"));
        assert!(content.contains("caused by: connection reset"));
    }

    #[test]
    fn test_source_below_error_not_captured() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let (logger, engine) = direct_logger(&dir, LogLevel::Fatal, LogLevel::Info);
        logger.log_with_source(LogLevel::Warn, "soft failure", &Outer(Inner));
        engine.shutdown();

        let content = std::fs::read_to_string(dir.path().join("full.log")).unwrap();
        assert!(content.contains("soft failure"));
        assert!(!content.contains("caused by"));
    }
}
