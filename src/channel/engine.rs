//! Local write engine (direct mode)
//!
//! Many-producer/single-consumer: callers enqueue onto a bounded channel
//! and a single background thread owns the [`FileSink`]. `enqueue()` never
//! blocks and never fails; a full queue drops the record with a
//! rate-limited diagnostic.

use crate::core::{ChannelItem, LogRecord, PipelineMetrics};
use crate::sinks::FileSink;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Bounded wait for the queue to drain during shutdown.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounded wait for the consumer thread to exit, applied twice.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Consumer poll interval; the stop flag is observed at this cadence even
/// on an idle queue.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

struct EngineInner {
    sender: Sender<ChannelItem>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

/// Asynchronous write pipeline for a single process.
///
/// Lifecycle: `new()` (stopped) → `start()` (running, spawns the consumer)
/// → `shutdown()` (drains, stops, clears state). `start()` is idempotent
/// while running; `enqueue()` while stopped is a silent no-op.
pub struct WriteEngine {
    capacity: usize,
    metrics: Arc<PipelineMetrics>,
    inner: RwLock<Option<EngineInner>>,
}

impl WriteEngine {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_metrics(capacity, Arc::new(PipelineMetrics::new()))
    }

    #[must_use]
    pub fn with_metrics(capacity: usize, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            capacity,
            metrics,
            inner: RwLock::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Records currently buffered, 0 when stopped.
    pub fn pending(&self) -> usize {
        self.inner.read().as_ref().map_or(0, |inner| inner.sender.len())
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Start the consumer thread, handing it exclusive ownership of `sink`.
    /// A second call while running is a no-op.
    pub fn start(&self, sink: FileSink) {
        let mut inner = self.inner.write();
        if inner.is_some() {
            return;
        }

        let (sender, receiver) = bounded(self.capacity);
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_metrics = Arc::clone(&self.metrics);

        let handle = thread::Builder::new()
            .name("relay-writer".into())
            .spawn(move || consume(receiver, sink, thread_stop, thread_metrics));

        match handle {
            Ok(handle) => {
                *inner = Some(EngineInner {
                    sender,
                    stop,
                    handle: Some(handle),
                });
            }
            Err(e) => {
                eprintln!("[RELAY ERROR] could not spawn writer thread: {}", e);
            }
        }
    }

    /// Non-blocking enqueue. Drops on a full queue, no-ops when stopped.
    pub fn enqueue(&self, record: LogRecord) {
        let inner = self.inner.read();
        let Some(inner) = inner.as_ref() else {
            return;
        };
        match inner.sender.try_send(ChannelItem::Record(record)) {
            Ok(()) => {
                self.metrics.record_enqueued();
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.record_queue_full();
                self.metrics.record_dropped_with_alert("write engine");
            }
            Err(TrySendError::Disconnected(_)) => {
                // Consumer already gone, shutdown in progress
            }
        }
    }

    /// Poll until the queue is empty on two consecutive checks or `timeout`
    /// elapses. Returns whether the queue drained.
    pub fn flush(&self, timeout: Duration) -> bool {
        let sender = {
            let inner = self.inner.read();
            match inner.as_ref() {
                Some(inner) => inner.sender.clone(),
                None => return true,
            }
        };
        drain(&sender, timeout)
    }

    /// Orderly shutdown: bounded flush, sentinel, stop flag, bounded join
    /// with one retry. State is cleared unconditionally, so a later
    /// `start()` rebuilds cleanly even if a write was stuck.
    pub fn shutdown(&self) {
        let Some(inner) = self.inner.write().take() else {
            return;
        };

        if !drain(&inner.sender, FLUSH_TIMEOUT) {
            eprintln!(
                "[RELAY WARNING] queue did not drain within {:?}; remaining records may be lost",
                FLUSH_TIMEOUT
            );
        }

        let _ = inner.sender.try_send(ChannelItem::Shutdown);
        inner.stop.store(true, Ordering::SeqCst);

        if let Some(handle) = inner.handle {
            join_with_timeout(handle, JOIN_TIMEOUT, "writer");
        }
    }
}

impl Drop for WriteEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Consumer loop. Runs on the dedicated writer thread, which is the only
/// code that ever touches the sink. The sink is flushed and closed after
/// the loop no matter how it exits.
fn consume(
    receiver: Receiver<ChannelItem>,
    mut sink: FileSink,
    stop: Arc<AtomicBool>,
    metrics: Arc<PipelineMetrics>,
) {
    loop {
        match receiver.recv_timeout(POLL_TIMEOUT) {
            Ok(ChannelItem::Record(record)) => {
                write_one(&mut sink, &record, &metrics);
            }
            Ok(ChannelItem::Shutdown) => break,
            Err(RecvTimeoutError::Timeout) => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    sink.close();
}

/// Process one record with panic isolation, so a single poisoned record
/// can never kill the consumer thread.
pub(crate) fn write_one(sink: &mut FileSink, record: &LogRecord, metrics: &PipelineMetrics) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.write(record)));
    match result {
        Ok(()) => {
            metrics.record_written();
        }
        Err(panic_info) => {
            let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            eprintln!("[RELAY ERROR] record write panicked: {}; consumer continues", msg);
            metrics.record_dropped();
        }
    }
}

/// Wait until `sender`'s queue is empty on two consecutive checks or
/// `timeout` elapses.
fn drain(sender: &Sender<ChannelItem>, timeout: Duration) -> bool {
    let start = Instant::now();
    let mut empty_streak = 0u8;
    loop {
        if sender.is_empty() {
            empty_streak += 1;
            if empty_streak >= 2 {
                return true;
            }
        } else {
            empty_streak = 0;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

/// Join `handle` within `timeout`, retrying once, then give up with a
/// diagnostic. Shutdown proceeds regardless.
pub(crate) fn join_with_timeout(handle: thread::JoinHandle<()>, timeout: Duration, who: &str) {
    for attempt in 0..2 {
        let start = Instant::now();
        while !handle.is_finished() && start.elapsed() < timeout {
            thread::sleep(Duration::from_millis(10));
        }
        if handle.is_finished() {
            if let Err(e) = handle.join() {
                eprintln!("[RELAY ERROR] {} thread panicked during shutdown: {:?}", who, e);
            }
            return;
        }
        if attempt == 0 {
            eprintln!(
                "[RELAY WARNING] {} thread still busy after {:?}, retrying join",
                who, timeout
            );
        }
    }
    eprintln!("[RELAY WARNING] {} thread did not finish; shutdown proceeds without it", who);
}
