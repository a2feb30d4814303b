//! Log record and channel element types

use super::error::{RelayError, Result};
use super::level::LogLevel;
use serde::{Deserialize, Serialize};

/// Maximum accepted scope name length, in bytes.
pub const MAX_SCOPE_LEN: usize = 64;

/// The immutable unit of work flowing through the pipeline.
///
/// `rendered_line` is already formatted by the caller's formatter and is
/// persisted verbatim. A record is created at the call site, owned by
/// whichever consumer dequeues it, and discarded after a single write
/// attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub rendered_line: String,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<u32>,
}

impl LogRecord {
    pub fn new(rendered_line: impl Into<String>, level: LogLevel, scope: impl Into<String>) -> Self {
        Self {
            rendered_line: rendered_line.into(),
            level,
            scope: scope.into(),
            exception_text: None,
            worker_id: None,
        }
    }

    #[must_use]
    pub fn with_exception(mut self, text: impl Into<String>) -> Self {
        self.exception_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_worker(mut self, worker_id: u32) -> Self {
        self.worker_id = Some(worker_id);
        self
    }
}

/// Element of the record queue, in-process and on the wire alike.
///
/// `Shutdown` is the stop sentinel: a plain value, so it survives
/// serialization across the process boundary and needs no identity
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelItem {
    Record(LogRecord),
    Shutdown,
}

/// Validate a scope name at logger-acquisition time.
///
/// Length violations fail loudly even before the pipeline is initialized.
pub fn validate_scope(scope: &str) -> Result<()> {
    if scope.len() > MAX_SCOPE_LEN {
        return Err(RelayError::ScopeNameTooLong {
            scope: scope.to_string(),
            max: MAX_SCOPE_LEN,
        });
    }
    Ok(())
}
