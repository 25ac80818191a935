// MIT License - Copyright (c) 2026 Peter Wright
// Observability sink

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Poll task names used for the poll gauge.
pub const ALARM_TASK: &str = "alarm";
pub const SENSORS_TASK: &str = "sensors";

pub const OCCUPANCY_TRIGGERS: &str = "vedo_occupancy_triggers_total";
pub const POLLS_TOTAL: &str = "vedo_polls_total";
pub const POLL_TIMESTAMP: &str = "vedo_poll_timestamp_seconds";

/// Counter/gauge sink fed by the bridge. Exporting is left to the host.
pub trait MetricsSink: Send + Sync {
    /// A zone went from closed to open.
    fn occupancy_triggered(&self, zone: &str);

    /// A poll cycle of `task` completed successfully.
    fn poll_completed(&self, task: &str);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn occupancy_triggered(&self, _zone: &str) {}
    fn poll_completed(&self, _task: &str) {}
}

/// Describe the bridge metrics to the installed recorder.
///
/// Call once after the host has installed its recorder (e.g. a Prometheus
/// exporter).
pub fn describe_metrics() {
    describe_counter!(
        OCCUPANCY_TRIGGERS,
        "Number of times a zone went from closed to open"
    );
    describe_counter!(POLLS_TOTAL, "Completed poll cycles per task");
    describe_gauge!(
        POLL_TIMESTAMP,
        "Unix time of the last completed poll cycle per task"
    );
}

/// Records through the `metrics` facade. Without an installed recorder
/// every call is a no-op.
#[derive(Debug, Default)]
pub struct BridgeMetrics;

impl BridgeMetrics {
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSink for BridgeMetrics {
    fn occupancy_triggered(&self, zone: &str) {
        counter!(OCCUPANCY_TRIGGERS, "zone" => zone.to_string()).increment(1);
    }

    fn poll_completed(&self, task: &str) {
        counter!(POLLS_TOTAL, "task" => task.to_string()).increment(1);
        gauge!(POLL_TIMESTAMP, "task" => task.to_string())
            .set(Utc::now().timestamp_millis() as f64 / 1000.0);
    }
}
