use std::sync::atomic::{AtomicUsize, Ordering};

/// Relay counters for one emulator instance.
/// These are updated by the reactor thread and read from anywhere.
#[derive(Debug, Default)]
pub struct EmulatorStats {
    /// Datagrams accepted from either peer.
    packets_rx: AtomicUsize,
    /// Payload bytes accepted from either peer.
    bytes_rx: AtomicUsize,
    /// Datagrams sent out, duplicates included.
    packets_tx: AtomicUsize,
    /// Payload bytes sent out, duplicates included.
    bytes_tx: AtomicUsize,
    /// Datagrams the impairment model decided to drop.
    policy_drops: AtomicUsize,
    /// Datagrams from addresses that are neither peer.
    stranger_drops: AtomicUsize,
}

impl EmulatorStats {
    #[inline]
    pub(crate) fn increment_rx(&self, bytes: usize) {
        self.packets_rx.fetch_add(1, Ordering::Relaxed);
        self.bytes_rx.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_tx(&self, bytes: usize) {
        self.packets_tx.fetch_add(1, Ordering::Relaxed);
        self.bytes_tx.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_policy_drops(&self) {
        self.policy_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_stranger_drops(&self) {
        self.stranger_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn packets_rx(&self) -> usize {
        self.packets_rx.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_rx(&self) -> usize {
        self.bytes_rx.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn packets_tx(&self) -> usize {
        self.packets_tx.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_tx(&self) -> usize {
        self.bytes_tx.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn policy_drops(&self) -> usize {
        self.policy_drops.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn stranger_drops(&self) -> usize {
        self.stranger_drops.load(Ordering::Relaxed)
    }
}
