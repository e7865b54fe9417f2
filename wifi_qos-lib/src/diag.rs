use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

/// Hook for the drops and skips that are deliberately silent in steady
/// state. The service never reacts to these; the hook only makes them
/// observable to tests and operators.
pub trait Diag: Send + Sync {
    /// A publish toward the destination path failed and was discarded.
    fn publish_dropped(&self) {}
    /// An inbound netlink message or datagram did not match the expected
    /// shape and was skipped.
    fn frame_skipped(&self) {}
    /// A sample was encoded and handed to the datagram channel.
    fn sample_sent(&self) {}
}

/// Default hook: debug-level log lines, nothing else.
#[derive(Default)]
pub struct LogDiag;

impl Diag for LogDiag {
    fn publish_dropped(&self) {
        debug!("sample dropped: destination unreachable");
    }
    fn frame_skipped(&self) {
        debug!("skipped frame that did not match expected shape");
    }
}

/// Counting hook used by tests to assert on drop/skip totals.
#[derive(Default)]
pub struct CountingDiag {
    pub dropped: AtomicU64,
    pub skipped: AtomicU64,
    pub sent: AtomicU64,
}

impl Diag for CountingDiag {
    fn publish_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
    fn frame_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }
    fn sample_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }
}

pub type SharedDiag = Arc<dyn Diag>;
