use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    if PROM_HANDLE.get().is_none() {
        let handle = PrometheusBuilder::new().install_recorder()?;
        let _ = PROM_HANDLE.set(handle);
        describe();
    }
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

fn describe() {
    describe_counter!("submissions_created_total", "Accepted submissions by mode");
    describe_counter!("submission_pipeline_total", "Pipeline runs by terminal status");
    describe_histogram!(
        "correction_duration_seconds",
        Unit::Seconds,
        "Wall time spent waiting on the correction provider"
    );
    describe_counter!("stream_connections_total", "Opened submission event streams");
    describe_counter!(
        "stream_events_dropped_total",
        "Events dropped because a listener buffer was full"
    );
    describe_counter!(
        "archived_submissions_purged_total",
        "Archived submissions deleted after the retention window"
    );
}
