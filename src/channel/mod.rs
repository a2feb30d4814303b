//! Record queue pipeline: local write engine and the cross-process channel

pub mod engine;
pub mod receiver;
pub mod sender;

pub use engine::{WriteEngine, FLUSH_TIMEOUT, JOIN_TIMEOUT, POLL_TIMEOUT};
pub use receiver::QueueReceiver;
pub use sender::QueueSender;

use crate::core::LogRecord;
use std::sync::Arc;

/// Where a process's records go: its own engine (direct mode) or the
/// collector's queue (queue mode). Exactly one per ready pipeline.
pub(crate) enum RecordRoute {
    Direct(Arc<WriteEngine>),
    Queue(QueueSender),
}

impl RecordRoute {
    pub(crate) fn push(&self, record: LogRecord) {
        match self {
            RecordRoute::Direct(engine) => engine.enqueue(record),
            RecordRoute::Queue(sender) => sender.send(record),
        }
    }
}
