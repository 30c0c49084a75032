//! Metrics utilities module
//!
//! Atomic counters for the confirmation flow, served as JSON from the
//! metrics endpoint.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Metrics data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    /// Payment attempts initiated
    pub attempts_initiated: u64,

    /// Status-check polls issued
    pub polls_issued: u64,

    /// Polls that failed transiently and were retried
    pub transient_poll_errors: u64,

    /// Attempts that ended in success
    pub succeeded: u64,

    /// Attempts the gateway declined
    pub declined: u64,

    /// Attempts that exhausted the polling budget
    pub timed_out: u64,

    /// Attempts cancelled before a terminal state
    pub cancelled: u64,

    /// Entitlement refreshes that failed after a successful payment
    pub refresh_warnings: u64,

    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Metrics utilities for the application
pub struct MetricsUtils {
    attempts_initiated: AtomicU64,
    polls_issued: AtomicU64,
    transient_poll_errors: AtomicU64,
    succeeded: AtomicU64,
    declined: AtomicU64,
    timed_out: AtomicU64,
    cancelled: AtomicU64,
    refresh_warnings: AtomicU64,
    start_time: SystemTime,
}

impl MetricsUtils {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            attempts_initiated: AtomicU64::new(0),
            polls_issued: AtomicU64::new(0),
            transient_poll_errors: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            declined: AtomicU64::new(0),
            timed_out: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            refresh_warnings: AtomicU64::new(0),
            start_time: SystemTime::now(),
        }
    }

    pub fn increment_attempts_initiated(&self) {
        self.attempts_initiated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_polls_issued(&self) {
        self.polls_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transient_poll_errors(&self) {
        self.transient_poll_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_declined(&self) {
        self.declined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_refresh_warnings(&self) {
        self.refresh_warnings.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> Metrics {
        let uptime = SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs();

        Metrics {
            attempts_initiated: self.attempts_initiated.load(Ordering::Relaxed),
            polls_issued: self.polls_issued.load(Ordering::Relaxed),
            transient_poll_errors: self.transient_poll_errors.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            declined: self.declined.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            refresh_warnings: self.refresh_warnings.load(Ordering::Relaxed),
            uptime_seconds: uptime,
        }
    }
}

impl Default for MetricsUtils {
    fn default() -> Self {
        Self::new()
    }
}
