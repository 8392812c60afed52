// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use rootledger_node::config::NodeConfig;
use rootledger_node::engine::Engine;
use rootledger_node::server::{build_router, SharedEngine};
use rootledger_node::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_telemetry()?;

    let cfg = NodeConfig::from_env()?;
    tracing::info!("Initializing rootledger node with config: {:?}", cfg);

    // Fails closed on a corrupt log or a genesis that disagrees with cfg.
    let engine = Engine::new(&cfg)?;
    let shared_state: SharedEngine = Arc::new(Mutex::new(engine));

    // Spawn Persistence Task
    if let (Some(_), Some(secs)) = (&cfg.snapshot_path, cfg.auto_snapshot_interval_secs) {
        let state_clone = shared_state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(secs));
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                tracing::debug!("Auto-snapshotting...");
                let engine = state_clone.lock().await;
                if let Err(e) = engine.save_snapshot() {
                    tracing::error!("Snapshot failed: {}", e);
                }
            }
        });
    }

    let app = build_router(shared_state);

    let addr = cfg.bind_addr;
    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
