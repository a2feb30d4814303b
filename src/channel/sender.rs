//! Worker-side queue sender
//!
//! Ships records to the collector's shared queue. The queue is a
//! Unix-domain datagram socket; each record travels as one JSON datagram,
//! so message boundaries survive the process hop. `send()` never blocks
//! and never fails: a full kernel buffer drops the record with a
//! rate-limited diagnostic.

use crate::core::{ChannelItem, LogRecord, PipelineMetrics, RelayError, Result};
use std::io::ErrorKind;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct QueueSender {
    socket: UnixDatagram,
    queue_path: PathBuf,
    worker_id: u32,
    metrics: Arc<PipelineMetrics>,
}

impl QueueSender {
    /// Connect to the collector's queue. A missing or unbound socket path
    /// is a configuration error, surfaced here rather than on first send.
    pub fn connect(queue_path: impl Into<PathBuf>) -> Result<Self> {
        Self::connect_with_metrics(queue_path, Arc::new(PipelineMetrics::new()))
    }

    pub fn connect_with_metrics(
        queue_path: impl Into<PathBuf>,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self> {
        let queue_path = queue_path.into();
        let socket = UnixDatagram::unbound()?;
        socket.connect(&queue_path).map_err(|e| {
            RelayError::queue(queue_path.display().to_string(), e.to_string())
        })?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            queue_path,
            worker_id: std::process::id(),
            metrics,
        })
    }

    pub fn queue_path(&self) -> &Path {
        &self.queue_path
    }

    pub fn worker_id(&self) -> u32 {
        self.worker_id
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Non-blocking send with the worker id attached. Drops on overload.
    pub fn send(&self, record: LogRecord) {
        let item = ChannelItem::Record(record.with_worker(self.worker_id));
        let bytes = match serde_json::to_vec(&item) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("[RELAY ERROR] record serialization failed: {}", e);
                self.metrics.record_dropped();
                return;
            }
        };
        match self.socket.send(&bytes) {
            Ok(_) => {
                self.metrics.record_enqueued();
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                self.metrics.record_queue_full();
                self.metrics.record_dropped_with_alert("queue sender");
            }
            Err(e) => {
                eprintln!(
                    "[RELAY ERROR] send to '{}' failed: {}",
                    self.queue_path.display(),
                    e
                );
                self.metrics.record_dropped();
            }
        }
    }

    /// Best-effort shutdown sentinel, for tests and collectors tearing
    /// down their own queue.
    pub fn send_shutdown(&self) {
        if let Ok(bytes) = serde_json::to_vec(&ChannelItem::Shutdown) {
            let _ = self.socket.send(&bytes);
        }
    }
}
