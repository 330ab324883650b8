use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Counters written by the audio thread and read from anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeSnapshot {
    pub blocks_processed: u64,
    pub blocks_skipped: u64,
    pub engine_faults: u64,
    pub parameters_applied: u64,
    pub parameters_dropped: u64,
    pub messages_forwarded: u64,
    pub messages_discarded: u64,
}

#[derive(Debug, Clone, Default)]
pub struct BridgeStats {
    inner: Arc<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    blocks_processed: AtomicU64,
    blocks_skipped: AtomicU64,
    engine_faults: AtomicU64,
    parameters_applied: AtomicU64,
    parameters_dropped: AtomicU64,
    messages_forwarded: AtomicU64,
    messages_discarded: AtomicU64,
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn snapshot(&self) -> BridgeSnapshot {
        let inner = &self.inner;
        BridgeSnapshot {
            blocks_processed: inner.blocks_processed.load(Ordering::Relaxed),
            blocks_skipped: inner.blocks_skipped.load(Ordering::Relaxed),
            engine_faults: inner.engine_faults.load(Ordering::Relaxed),
            parameters_applied: inner.parameters_applied.load(Ordering::Relaxed),
            parameters_dropped: inner.parameters_dropped.load(Ordering::Relaxed),
            messages_forwarded: inner.messages_forwarded.load(Ordering::Relaxed),
            messages_discarded: inner.messages_discarded.load(Ordering::Relaxed),
        }
    }

    #[inline]
    pub(crate) fn block_processed(&self) {
        self.inner.blocks_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn block_skipped(&self) {
        self.inner.blocks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn engine_fault(&self) {
        self.inner.engine_faults.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn parameter_applied(&self) {
        self.inner.parameters_applied.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn parameter_dropped(&self) {
        self.inner.parameters_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn message_forwarded(&self) {
        self.inner.messages_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn message_discarded(&self) {
        self.inner.messages_discarded.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let stats = BridgeStats::new();
        let reader = stats.clone();
        stats.block_processed();
        stats.block_processed();
        stats.parameter_dropped();
        let snapshot = reader.snapshot();
        assert_eq!(snapshot.blocks_processed, 2);
        assert_eq!(snapshot.parameters_dropped, 1);
        assert_eq!(snapshot.messages_forwarded, 0);
    }
}
