//! Metrics collection for packet statistics.
//!
//! Thread-safe counters shared by every listener and responder in the
//! process; exported once at shutdown as a processing summary.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter for thread-safe increment operations.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Creates a new counter initialized to zero.
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increments the counter by 1.
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds a value to the counter.
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Gets the current value of the counter.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters for Neighbor Discovery processing.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Solicitations accepted off the wire.
    pub solicitations_received: Counter,
    /// Advertisements accepted off the wire.
    pub advertisements_received: Counter,
    /// Packets transmitted (answers and forwards).
    pub packets_sent: Counter,
    /// Requests whose target was outside the whitelist.
    pub whitelist_drops: Counter,
    /// Requests discarded for a bad ICMPv6 checksum.
    pub checksum_drops: Counter,
    /// Advertisements with no recorded question to match.
    pub uncorrelated_drops: Counter,
    /// Requests dropped because a worker queue was full.
    pub queue_drops: Counter,
    /// Transmit failures reported by the kernel.
    pub tx_errors: Counter,
}

impl EngineMetrics {
    /// Creates a new metrics block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exports all metrics as key-value pairs.
    pub fn export(&self) -> Vec<(&'static str, u64)> {
        vec![
            (
                "solicitations_received",
                self.solicitations_received.get(),
            ),
            (
                "advertisements_received",
                self.advertisements_received.get(),
            ),
            ("packets_sent", self.packets_sent.get()),
            ("whitelist_drops", self.whitelist_drops.get()),
            ("checksum_drops", self.checksum_drops.get()),
            ("uncorrelated_drops", self.uncorrelated_drops.get()),
            ("queue_drops", self.queue_drops.get()),
            ("tx_errors", self.tx_errors.get()),
        ]
    }
}
