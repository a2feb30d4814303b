//! Pipeline lifecycle management
//!
//! [`Relay`] is the single source of truth for readiness: one explicit
//! instance (used through an `Arc`, never a hidden global) owning the
//! configuration, the active engine or channel side, and the exit/signal
//! safety net. `init()` is idempotent while ready, `teardown()` always
//! lands in the not-ready state, and requesting a logger before `init()`
//! falls back to last-known or environment-derived configuration.

use super::config::{RelayConfig, RelayMode};
use super::dispatch::ScopedLogger;
use super::error::{RelayError, Result};
use super::level::LogLevel;
use super::metrics::PipelineMetrics;
use super::record::{validate_scope, LogRecord};
use crate::channel::{QueueReceiver, QueueSender, RecordRoute, WriteEngine};
use crate::sinks::{ConsoleSink, FileSink};
use parking_lot::Mutex;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct ActivePipeline {
    route: Arc<RecordRoute>,
    /// Present in direct mode only.
    engine: Option<Arc<WriteEngine>>,
    /// Present in collector mode only.
    receiver: Option<QueueReceiver>,
}

struct RelayInner {
    /// Last-known configuration; survives teardown for implicit re-init.
    config: Option<RelayConfig>,
    /// READY iff `Some`.
    active: Option<ActivePipeline>,
    signals_installed: bool,
}

/// Lifecycle manager for one process's logging pipeline.
pub struct Relay {
    inner: Mutex<RelayInner>,
    metrics: Arc<PipelineMetrics>,
}

impl Relay {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RelayInner {
                config: None,
                active: None,
                signals_installed: false,
            }),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Validate the configuration, create the session directory, start the
    /// engine or channel side for the configured mode, and install the
    /// signal safety net. A no-op while already ready.
    pub fn init(self: &Arc<Self>, config: RelayConfig) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.active.is_some() {
            return Ok(());
        }
        self.init_locked(&mut inner, config)
    }

    fn init_locked(self: &Arc<Self>, inner: &mut RelayInner, config: RelayConfig) -> Result<()> {
        config.validate()?;
        fs::create_dir_all(&config.session_dir).map_err(|e| {
            RelayError::session_dir(config.session_dir.display().to_string(), e)
        })?;

        let active = self.build_pipeline(&config)?;
        self.install_signal_net(inner);
        inner.config = Some(config);
        inner.active = Some(active);
        Ok(())
    }

    fn build_pipeline(&self, config: &RelayConfig) -> Result<ActivePipeline> {
        match config.mode {
            RelayMode::Direct => {
                let engine = Arc::new(WriteEngine::with_metrics(
                    config.queue_capacity,
                    Arc::clone(&self.metrics),
                ));
                engine.start(FileSink::new(&config.session_dir));
                Ok(ActivePipeline {
                    route: Arc::new(RecordRoute::Direct(Arc::clone(&engine))),
                    engine: Some(engine),
                    receiver: None,
                })
            }
            RelayMode::Worker => {
                let queue_path = config.queue_path.as_ref().ok_or_else(|| {
                    RelayError::config("queue_path", "worker mode requires a shared queue path")
                })?;
                let sender =
                    QueueSender::connect_with_metrics(queue_path, Arc::clone(&self.metrics))?;
                Ok(ActivePipeline {
                    route: Arc::new(RecordRoute::Queue(sender)),
                    engine: None,
                    receiver: None,
                })
            }
            RelayMode::Collector => {
                let queue_path = config.queue_path.as_ref().ok_or_else(|| {
                    RelayError::config("queue_path", "collector mode requires a shared queue path")
                })?;
                let receiver = QueueReceiver::start_with_metrics(
                    queue_path,
                    FileSink::new(&config.session_dir),
                    Arc::clone(&self.metrics),
                )?;
                // The collector's own records go through a loopback sender
                // so the consumer thread stays the sole writer.
                let loopback =
                    QueueSender::connect_with_metrics(queue_path, Arc::clone(&self.metrics))?;
                Ok(ActivePipeline {
                    route: Arc::new(RecordRoute::Queue(loopback)),
                    engine: None,
                    receiver: Some(receiver),
                })
            }
        }
    }

    /// Watch SIGINT/SIGTERM from a detached thread: tear the pipeline down,
    /// then re-deliver the signal via the platform default handler so the
    /// process still dies with the conventional status.
    fn install_signal_net(self: &Arc<Self>, inner: &mut RelayInner) {
        if inner.signals_installed {
            return;
        }
        match Signals::new([SIGINT, SIGTERM]) {
            Ok(mut signals) => {
                let weak = Arc::downgrade(self);
                let spawned = thread::Builder::new()
                    .name("relay-signals".into())
                    .spawn(move || {
                        if let Some(signal) = signals.forever().next() {
                            if let Some(relay) = weak.upgrade() {
                                relay.teardown();
                            }
                            let _ = signal_hook::low_level::emulate_default_handler(signal);
                        }
                    });
                match spawned {
                    Ok(_) => inner.signals_installed = true,
                    Err(e) => {
                        eprintln!("[RELAY WARNING] could not spawn signal watcher: {}", e);
                    }
                }
            }
            Err(e) => {
                eprintln!("[RELAY WARNING] could not install signal handlers: {}", e);
            }
        }
    }

    /// Flush and stop the active engine or channel side. Unconditionally
    /// lands in NOT_READY, even if the stop sequence itself misbehaved;
    /// the last-known configuration is kept for implicit re-init.
    pub fn teardown(&self) {
        let mut inner = self.inner.lock();
        let Some(active) = inner.active.take() else {
            return;
        };
        if let Some(engine) = active.engine {
            engine.shutdown();
        }
        if let Some(mut receiver) = active.receiver {
            receiver.stop();
        }
        // Worker mode: dropping the route closes the sender socket.
    }

    /// Acquire a logger for `scope` with thresholds from configuration.
    ///
    /// When not ready, performs an implicit best-effort init from
    /// last-known configuration, falling back to `LOG_RELAY_*` environment
    /// variables. Scope-name validation fails loudly regardless of state.
    pub fn logger(self: &Arc<Self>, scope: &str) -> Result<ScopedLogger> {
        self.logger_with_levels(scope, None, None)
    }

    /// Like [`Relay::logger`], overriding the console and/or file
    /// thresholds for this handle only.
    pub fn logger_with_levels(
        self: &Arc<Self>,
        scope: &str,
        console_level: Option<LogLevel>,
        file_level: Option<LogLevel>,
    ) -> Result<ScopedLogger> {
        validate_scope(scope)?;

        let mut inner = self.inner.lock();
        if inner.active.is_none() {
            let config = match inner.config.clone() {
                Some(config) => config,
                None => RelayConfig::from_env()?,
            };
            self.init_locked(&mut inner, config)?;
        }

        let config = inner.config.as_ref().ok_or_else(|| {
            RelayError::config("lifecycle", "no configuration after init")
        })?;
        let levels = config.levels_for(scope);
        let route = inner
            .active
            .as_ref()
            .map(|active| Arc::clone(&active.route))
            .ok_or_else(|| RelayError::config("lifecycle", "pipeline not running"))?;

        Ok(ScopedLogger::new(
            scope,
            console_level.unwrap_or(levels.console_level),
            file_level.unwrap_or(levels.file_level),
            route,
            ConsoleSink::new(),
        ))
    }

    /// Raw file-pipeline entry: route one pre-rendered line, bypassing the
    /// threshold check. A silent no-op when not ready, matching engine
    /// semantics.
    pub fn enqueue(
        &self,
        rendered_line: impl Into<String>,
        level: LogLevel,
        scope: impl Into<String>,
        exception_text: Option<String>,
    ) {
        let route = {
            let inner = self.inner.lock();
            match inner.active.as_ref() {
                Some(active) => Arc::clone(&active.route),
                None => return,
            }
        };
        let mut record = LogRecord::new(rendered_line, level, scope);
        if let Some(text) = exception_text {
            record = record.with_exception(text);
        }
        route.push(record);
    }

    /// Drain the direct-mode queue within `timeout`. Queue modes have no
    /// local queue to drain and report success.
    pub fn flush(&self, timeout: Duration) -> bool {
        let engine = {
            let inner = self.inner.lock();
            inner
                .active
                .as_ref()
                .and_then(|active| active.engine.as_ref().map(Arc::clone))
        };
        match engine {
            Some(engine) => engine.flush(timeout),
            None => true,
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        // The at-exit half of the safety net: an instance going away takes
        // its pipeline down in order.
        self.teardown();
    }
}
