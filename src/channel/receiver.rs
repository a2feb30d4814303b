//! Collector-side queue receiver
//!
//! Binds the shared queue socket, owns the session's [`FileSink`], and
//! drains datagrams on a dedicated consumer thread using the same
//! poll/stop pattern as the local write engine. The stop sentinel is a
//! plain value ([`ChannelItem::Shutdown`]) so it can arrive from any
//! process.

use super::engine::{join_with_timeout, write_one, JOIN_TIMEOUT, POLL_TIMEOUT};
use crate::core::{ChannelItem, PipelineMetrics, RelayError, Result};
use crate::sinks::FileSink;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Upper bound on one wire element. Larger datagrams fail at the sender
/// and are dropped there.
const MAX_DATAGRAM: usize = 64 * 1024;

pub struct QueueReceiver {
    queue_path: PathBuf,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    metrics: Arc<PipelineMetrics>,
}

impl QueueReceiver {
    /// Create the shared queue and start consuming into `sink`. Binding
    /// failure is a configuration error raised here, not on first record.
    pub fn start(queue_path: impl Into<PathBuf>, sink: FileSink) -> Result<Self> {
        Self::start_with_metrics(queue_path, sink, Arc::new(PipelineMetrics::new()))
    }

    pub fn start_with_metrics(
        queue_path: impl Into<PathBuf>,
        sink: FileSink,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self> {
        let queue_path = queue_path.into();

        // A stale socket file from a crashed collector would block the bind.
        if queue_path.exists() {
            let _ = fs::remove_file(&queue_path);
        }

        let socket = UnixDatagram::bind(&queue_path).map_err(|e| {
            RelayError::queue(queue_path.display().to_string(), e.to_string())
        })?;
        socket.set_read_timeout(Some(POLL_TIMEOUT))?;

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_metrics = Arc::clone(&metrics);

        let handle = thread::Builder::new()
            .name("relay-collector".into())
            .spawn(move || consume_socket(socket, sink, thread_stop, thread_metrics))
            .map_err(RelayError::from)?;

        Ok(Self {
            queue_path,
            stop,
            handle: Some(handle),
            metrics,
        })
    }

    pub fn queue_path(&self) -> &Path {
        &self.queue_path
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Best-effort sentinel push, stop flag, bounded join, then remove the
    /// socket file. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Ok(socket) = UnixDatagram::unbound() {
            if let Ok(bytes) = serde_json::to_vec(&ChannelItem::Shutdown) {
                let _ = socket.send_to(&bytes, &self.queue_path);
            }
        }
        self.stop.store(true, Ordering::SeqCst);

        if let Some(handle) = self.handle.take() {
            join_with_timeout(handle, JOIN_TIMEOUT, "collector");
        }
        let _ = fs::remove_file(&self.queue_path);
    }
}

impl Drop for QueueReceiver {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

/// Consumer loop for the collector thread, the only code touching the
/// sink. Malformed datagrams are diagnosed and skipped; the sink is
/// flushed and closed after the loop regardless of exit reason.
fn consume_socket(
    socket: UnixDatagram,
    mut sink: FileSink,
    stop: Arc<AtomicBool>,
    metrics: Arc<PipelineMetrics>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        match socket.recv(&mut buf) {
            Ok(len) => match serde_json::from_slice::<ChannelItem>(&buf[..len]) {
                Ok(ChannelItem::Record(record)) => {
                    write_one(&mut sink, &record, &metrics);
                }
                Ok(ChannelItem::Shutdown) => break,
                Err(e) => {
                    eprintln!("[RELAY ERROR] malformed datagram skipped: {}", e);
                }
            },
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
            }
            Err(e) => {
                eprintln!("[RELAY ERROR] queue receive failed: {}", e);
                if stop.load(Ordering::SeqCst) {
                    break;
                }
            }
        }
    }
    sink.close();
}
