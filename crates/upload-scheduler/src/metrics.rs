//! Scheduler metrics.
//!
//! Plain atomics, not a `Mutex`-guarded struct: these counters are read by
//! an operator (e.g. a metrics-scrape endpoint) from outside the scheduler's
//! own critical section, matching this codebase's distinction between
//! sequential-use metrics (plain fields, touched only by their owner while
//! already holding the relevant lock) and concurrently-read metrics (atomics).
//! This crate never aggregates timing or throughput — only counts. Rate and
//! latency measurement belong to whatever observability stack the operator
//! already runs.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time and cumulative counters describing scheduler activity.
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    /// Total uploads enqueued.
    pub enqueued_total: AtomicU64,
    /// Total uploads released by the Admission Loop.
    pub admitted_total: AtomicU64,
    /// Total uploads completed.
    pub completed_total: AtomicU64,
    /// Total `Complete` calls for an upload whose pinned group had already
    /// vanished by the time of completion (slot discarded, not decremented).
    pub orphaned_slots_total: AtomicU64,
    /// Total reconfigurations that changed the live group table.
    pub reconfigurations_applied_total: AtomicU64,
    /// Total reconfigurations skipped by the idempotence guard.
    pub reconfigurations_skipped_total: AtomicU64,
    /// Total reconfigurations rejected for invalid input.
    pub reconfigurations_rejected_total: AtomicU64,
}

impl SchedulerMetrics {
    pub(crate) fn record_enqueued(&self) {
        self.enqueued_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_admitted(&self) {
        self.admitted_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.completed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_orphaned_slot(&self) {
        self.orphaned_slots_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reconfigure_applied(&self) {
        self.reconfigurations_applied_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reconfigure_skipped(&self) {
        self.reconfigurations_skipped_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reconfigure_rejected(&self) {
        self.reconfigurations_rejected_total
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshots every counter. Intended for a metrics-scrape endpoint.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued_total: self.enqueued_total.load(Ordering::Relaxed),
            admitted_total: self.admitted_total.load(Ordering::Relaxed),
            completed_total: self.completed_total.load(Ordering::Relaxed),
            orphaned_slots_total: self.orphaned_slots_total.load(Ordering::Relaxed),
            reconfigurations_applied_total: self
                .reconfigurations_applied_total
                .load(Ordering::Relaxed),
            reconfigurations_skipped_total: self
                .reconfigurations_skipped_total
                .load(Ordering::Relaxed),
            reconfigurations_rejected_total: self
                .reconfigurations_rejected_total
                .load(Ordering::Relaxed),
        }
    }
}

/// A plain-value snapshot of [`SchedulerMetrics`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub enqueued_total: u64,
    pub admitted_total: u64,
    pub completed_total: u64,
    pub orphaned_slots_total: u64,
    pub reconfigurations_applied_total: u64,
    pub reconfigurations_skipped_total: u64,
    pub reconfigurations_rejected_total: u64,
}
