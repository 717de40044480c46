use crate::stream::DrainSummary;
use conductor_domain::Unit;
use metrics::{counter, histogram, Counter, Histogram};
use std::time::Duration;

pub const OUTBOX_FETCHED_KEY: &str = "outbox_fetched";
pub const OUTBOX_DELIVERED_KEY: &str = "outbox_delivered";
pub const OUTBOX_DEFERRED_KEY: &str = "outbox_deferred";
pub const OUTBOX_DROPPED_KEY: &str = "outbox_dropped";
pub const DISPATCH_ERRORS_KEY: &str = "dispatch_errors";
pub const DISPATCH_DURATION_KEY: &str = "dispatch_duration_seconds";

pub trait MetricExt {
    fn drained(&self, summary: &DrainSummary) -> Unit;
    fn errored(&self, value: u64) -> Unit;
    fn duration(&self, value: Duration) -> Unit;
}

/// Reconciliation counters, recorded through whichever recorder is installed.
pub struct MetricsRegistry {
    outbox_fetched: Counter,
    outbox_delivered: Counter,
    outbox_deferred: Counter,
    outbox_dropped: Counter,
    dispatch_errors: Counter,
    dispatch_duration: Histogram,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self {
            outbox_fetched: counter!(OUTBOX_FETCHED_KEY, "outbox" => "fetched"),
            outbox_delivered: counter!(OUTBOX_DELIVERED_KEY, "outbox" => "delivered"),
            outbox_deferred: counter!(OUTBOX_DEFERRED_KEY, "outbox" => "deferred"),
            outbox_dropped: counter!(OUTBOX_DROPPED_KEY, "outbox" => "dropped"),
            dispatch_errors: counter!(DISPATCH_ERRORS_KEY, "dispatch" => "errors"),
            dispatch_duration: histogram!(DISPATCH_DURATION_KEY, "dispatch" => "duration"),
        }
    }
}

impl MetricExt for MetricsRegistry {
    fn drained(&self, summary: &DrainSummary) -> Unit {
        self.outbox_fetched.increment(summary.fetched as u64);
        self.outbox_delivered.increment(summary.delivered as u64);
        self.outbox_deferred.increment(summary.deferred as u64);
        self.outbox_dropped.increment(summary.dropped as u64);
    }

    fn errored(&self, value: u64) -> Unit {
        self.dispatch_errors.increment(value);
    }

    fn duration(&self, value: Duration) -> Unit {
        self.dispatch_duration.record(value);
    }
}
