//! Dispatch counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters of one bus.
#[derive(Debug, Default)]
pub(crate) struct BusStats {
    published: AtomicU64,
    string_resolutions: AtomicU64,
    adaptable_resolutions: AtomicU64,
    persistent_deliveries: AtomicU64,
    unhandled: AtomicU64,
    timeouts: AtomicU64,
}

impl BusStats {
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_string_resolution(&self) {
        self.string_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_adaptable_resolution(&self) {
        self.adaptable_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_persistent_delivery(&self) {
        self.persistent_deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unhandled(&self) {
        self.unhandled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BusStatsSnapshot {
        BusStatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            string_resolutions: self.string_resolutions.load(Ordering::Relaxed),
            adaptable_resolutions: self.adaptable_resolutions.load(Ordering::Relaxed),
            persistent_deliveries: self.persistent_deliveries.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the bus counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusStatsSnapshot {
    /// Frames passed to `publish`.
    pub published: u64,
    /// One-time string waiters resolved by a frame.
    pub string_resolutions: u64,
    /// One-time adaptable waiters resolved by a frame.
    pub adaptable_resolutions: u64,
    /// Durable consumer invocations.
    pub persistent_deliveries: u64,
    /// Frames routed to the unhandled sink.
    pub unhandled: u64,
    /// One-time and idle timeouts that fired.
    pub timeouts: u64,
}
