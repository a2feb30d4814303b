//! Pipeline configuration
//!
//! One explicit struct with named fields and defaults, validated once at
//! init. The environment-derived constructor backs the implicit-init
//! fallback when a logger is requested before `init()`.

use super::error::{RelayError, Result};
use super::level::LogLevel;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Default bounded queue capacity for the direct-mode engine.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// How a process participates in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayMode {
    /// The process persists its own records via a local write engine.
    #[default]
    Direct,
    /// The process ships records to a collector instead of writing files.
    Worker,
    /// The process collects records shipped by workers and writes all files.
    Collector,
}

impl std::str::FromStr for RelayMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(RelayMode::Direct),
            "worker" => Ok(RelayMode::Worker),
            "collector" => Ok(RelayMode::Collector),
            _ => Err(format!("Invalid relay mode: '{}'", s)),
        }
    }
}

/// Per-scope threshold overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeLevels {
    pub console_level: LogLevel,
    pub file_level: LogLevel,
}

/// Configuration for one pipeline instance.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mode: RelayMode,
    /// Already-resolved output directory; created if absent at init.
    pub session_dir: PathBuf,
    /// Socket path of the shared queue; required in worker/collector mode.
    pub queue_path: Option<PathBuf>,
    /// Capacity of the direct-mode bounded queue.
    pub queue_capacity: usize,
    /// Global console threshold.
    pub console_level: LogLevel,
    /// Global file threshold.
    pub file_level: LogLevel,
    /// Per-scope overrides of the global thresholds.
    pub scope_levels: HashMap<String, ScopeLevels>,
}

impl RelayConfig {
    /// Direct-mode configuration with default thresholds.
    pub fn direct(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: RelayMode::Direct,
            session_dir: session_dir.into(),
            queue_path: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            console_level: LogLevel::Warn,
            file_level: LogLevel::Info,
            scope_levels: HashMap::new(),
        }
    }

    /// Worker-mode configuration shipping to `queue_path`.
    pub fn worker(session_dir: impl Into<PathBuf>, queue_path: impl Into<PathBuf>) -> Self {
        Self {
            mode: RelayMode::Worker,
            queue_path: Some(queue_path.into()),
            ..Self::direct(session_dir)
        }
    }

    /// Collector-mode configuration binding `queue_path`.
    pub fn collector(session_dir: impl Into<PathBuf>, queue_path: impl Into<PathBuf>) -> Self {
        Self {
            mode: RelayMode::Collector,
            queue_path: Some(queue_path.into()),
            ..Self::direct(session_dir)
        }
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_console_level(mut self, level: LogLevel) -> Self {
        self.console_level = level;
        self
    }

    #[must_use]
    pub fn with_file_level(mut self, level: LogLevel) -> Self {
        self.file_level = level;
        self
    }

    #[must_use]
    pub fn with_scope_levels(
        mut self,
        scope: impl Into<String>,
        console_level: LogLevel,
        file_level: LogLevel,
    ) -> Self {
        self.scope_levels.insert(
            scope.into(),
            ScopeLevels {
                console_level,
                file_level,
            },
        );
        self
    }

    /// Build a configuration from `LOG_RELAY_*` environment variables.
    ///
    /// `LOG_RELAY_DIR` is required; `LOG_RELAY_MODE` defaults to `direct`;
    /// `LOG_RELAY_QUEUE`, `LOG_RELAY_CONSOLE_LEVEL`, `LOG_RELAY_FILE_LEVEL`
    /// and `LOG_RELAY_CAPACITY` refine the defaults.
    pub fn from_env() -> Result<Self> {
        let session_dir = env::var("LOG_RELAY_DIR").map_err(|_| {
            RelayError::config("environment", "LOG_RELAY_DIR is not set")
        })?;
        let mut config = Self::direct(session_dir);

        if let Ok(mode) = env::var("LOG_RELAY_MODE") {
            config.mode = mode
                .parse()
                .map_err(|e: String| RelayError::config("LOG_RELAY_MODE", e))?;
        }
        if let Ok(queue) = env::var("LOG_RELAY_QUEUE") {
            config.queue_path = Some(PathBuf::from(queue));
        }
        if let Ok(level) = env::var("LOG_RELAY_CONSOLE_LEVEL") {
            config.console_level = level
                .parse()
                .map_err(|e: String| RelayError::config("LOG_RELAY_CONSOLE_LEVEL", e))?;
        }
        if let Ok(level) = env::var("LOG_RELAY_FILE_LEVEL") {
            config.file_level = level
                .parse()
                .map_err(|e: String| RelayError::config("LOG_RELAY_FILE_LEVEL", e))?;
        }
        if let Ok(capacity) = env::var("LOG_RELAY_CAPACITY") {
            config.queue_capacity = capacity.parse().map_err(|_| {
                RelayError::config("LOG_RELAY_CAPACITY", format!("not a number: '{}'", capacity))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate field combinations. Does not touch the filesystem; the
    /// lifecycle manager creates the session directory during init.
    pub fn validate(&self) -> Result<()> {
        if self.session_dir.as_os_str().is_empty() {
            return Err(RelayError::config("session_dir", "must not be empty"));
        }
        if self.queue_capacity == 0 {
            return Err(RelayError::config("queue_capacity", "must be at least 1"));
        }
        match self.mode {
            RelayMode::Direct => {}
            RelayMode::Worker | RelayMode::Collector => {
                if self.queue_path.is_none() {
                    return Err(RelayError::config(
                        "queue_path",
                        "queue mode requires a shared queue path",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Thresholds for `scope`, falling back to the global defaults.
    pub fn levels_for(&self, scope: &str) -> ScopeLevels {
        self.scope_levels.get(scope).copied().unwrap_or(ScopeLevels {
            console_level: self.console_level,
            file_level: self.file_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_defaults() {
        let config = RelayConfig::direct("/tmp/session");
        assert_eq!(config.mode, RelayMode::Direct);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_queue_mode_requires_path() {
        let mut config = RelayConfig::direct("/tmp/session");
        config.mode = RelayMode::Worker;
        assert!(config.validate().is_err());

        let config = RelayConfig::worker("/tmp/session", "/tmp/relay.sock");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = RelayConfig::direct("/tmp/session").with_queue_capacity(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scope_level_fallback() {
        let config = RelayConfig::direct("/tmp/session")
            .with_console_level(LogLevel::Error)
            .with_file_level(LogLevel::Debug)
            .with_scope_levels("chatty", LogLevel::Fatal, LogLevel::Warn);

        let chatty = config.levels_for("chatty");
        assert_eq!(chatty.console_level, LogLevel::Fatal);
        assert_eq!(chatty.file_level, LogLevel::Warn);

        let other = config.levels_for("other");
        assert_eq!(other.console_level, LogLevel::Error);
        assert_eq!(other.file_level, LogLevel::Debug);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("direct".parse::<RelayMode>().unwrap(), RelayMode::Direct);
        assert_eq!("Collector".parse::<RelayMode>().unwrap(), RelayMode::Collector);
        assert!("broker".parse::<RelayMode>().is_err());
    }
}
