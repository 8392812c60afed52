// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() -> Result<(), BuildError> {
    // 1. Initialize Tracing (Logs)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "rootledger_node=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Initialize Metrics (Prometheus)
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Store handle for /metrics endpoint
    if PROM_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
    }

    metrics::describe_counter!("rootledger_roots_published_total", "Roots committed across all series");
    metrics::describe_counter!("rootledger_distributions_created_total", "Distributions created");
    metrics::describe_counter!("rootledger_publish_rejected_total", "Publishes refused, labelled by reason");
    metrics::describe_counter!("rootledger_proofs_generated_total", "Ledger proofs generated");
    metrics::describe_histogram!("rootledger_event_commit_duration_seconds", "Time taken to commit an event");
    metrics::describe_histogram!("rootledger_replay_duration_seconds", "Time taken to replay the event log");
    metrics::describe_gauge!("rootledger_snapshot_size_bytes", "Size of the last saved snapshot in bytes");

    // Ensure at least one metric exists on startup
    metrics::gauge!("rootledger_node_up", 1.0);
    Ok(())
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
