//! Pipeline metrics for observability
//!
//! Counters for monitoring pipeline health: enqueued records, records
//! written to disk, drops due to queue overflow, and queue-full events.

use std::sync::atomic::{AtomicU64, Ordering};

/// How often a repeated drop is re-announced on stderr.
const DROP_ALERT_INTERVAL: u64 = 1000;

/// Metrics for pipeline observability
///
/// # Example
///
/// ```
/// use log_relay::PipelineMetrics;
///
/// let metrics = PipelineMetrics::new();
/// metrics.record_enqueued();
/// metrics.record_written();
/// assert_eq!(metrics.written_count(), 1);
/// ```
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Records accepted into the queue
    enqueued: AtomicU64,

    /// Records persisted by a consumer
    written: AtomicU64,

    /// Records dropped on overload or write failure
    dropped: AtomicU64,

    /// Number of times the queue was found full
    queue_full_events: AtomicU64,
}

impl PipelineMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            written: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn written_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_written(&self) -> u64 {
        self.written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a drop and emit a rate-limited stderr diagnostic.
    ///
    /// The first drop is announced immediately, subsequent ones every
    /// [`DROP_ALERT_INTERVAL`] drops, so an overload storm does not turn
    /// stderr into a second log stream.
    pub fn record_dropped_with_alert(&self, context: &str) {
        let previous = self.record_dropped();
        if previous == 0 || (previous + 1).is_multiple_of(DROP_ALERT_INTERVAL) {
            eprintln!(
                "[RELAY WARNING] {}: queue full, {} records dropped so far",
                context,
                previous + 1
            );
        }
    }

    /// Drop rate as a percentage (0.0 - 100.0) of all records seen.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.enqueued_count() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.written.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PipelineMetrics {
    /// Create a snapshot of the current metric values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued_count()),
            written: AtomicU64::new(self.written_count()),
            dropped: AtomicU64::new(self.dropped_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
        }
    }
}
