// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::{
    body::Body,
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::TypedHeader;
use futures::StreamExt;
use headers::authorization::Bearer;
use headers::Authorization;
use rootledger_kernel::state::registry::DistributionMetadata;
use rootledger_kernel::types::{DistributionId, Principal, SeriesKey, Timestamp};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::*;
use crate::engine::Engine;
use crate::errors::EngineError;
use crate::events::event_proof::LedgerProofView;

pub type SharedEngine = Arc<Mutex<Engine>>;

type Caller = Option<TypedHeader<Authorization<Bearer>>>;

fn principal(caller: &Caller) -> Option<Principal> {
    caller
        .as_ref()
        .map(|TypedHeader(auth)| auth.token().trim())
        .filter(|token| !token.is_empty())
        .map(Principal::new)
}

fn require_principal(caller: &Caller) -> Result<Principal, EngineError> {
    principal(caller).ok_or(EngineError::MissingCaller)
}

pub fn build_router(state: SharedEngine) -> Router {
    Router::new()
        .route("/v1/distributions", post(create_distribution))
        .route("/v1/distributions/:id", get(get_distribution))
        .route("/v1/distributions/:id/publish", post(publish))
        .route("/v1/distributions/:id/latest", get(latest))
        .route("/v1/distributions/:id/at", get(at))
        .route("/v1/default", get(get_default))
        .route("/v1/default/publish", post(publish_default))
        .route("/v1/default/latest", get(latest_default))
        .route("/v1/default/at", get(at_default))
        .route("/v1/events/stream", get(event_stream))
        // Proofs v1
        .route("/v1/proof/ledger", get(get_proof))
        // Admin v1
        .route("/v1/snapshot/save", post(snapshot_save))
        .route("/v1/log/download", get(download_log))
        // Observability
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// --- Distributions ---

async fn create_distribution(
    State(state): State<SharedEngine>,
    caller: Caller,
    Json(req): Json<CreateDistributionRequest>,
) -> Result<Json<CreateDistributionResponse>, EngineError> {
    let owner = require_principal(&caller)?;
    let mut engine = state.lock().await;
    let id = engine.create_distribution(
        owner,
        req.epoch_length,
        DistributionMetadata::new(req.name, req.description),
    )?;
    Ok(Json(CreateDistributionResponse { id: id.0 }))
}

async fn get_distribution(
    State(state): State<SharedEngine>,
    Path(id): Path<u64>,
) -> Result<Json<DistributionResponse>, EngineError> {
    let engine = state.lock().await;
    let distribution = engine.distribution(DistributionId(id))?;
    Ok(Json(DistributionResponse::from(distribution)))
}

async fn publish(
    State(state): State<SharedEngine>,
    Path(id): Path<u64>,
    caller: Caller,
    Json(req): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, EngineError> {
    let caller = require_principal(&caller)?;
    let root = parse_root(&req.root)?;
    let mut engine = state.lock().await;
    let receipt = engine.publish(DistributionId(id), &caller, root, Timestamp(req.end_timestamp))?;
    Ok(Json(receipt.into()))
}

async fn latest(
    State(state): State<SharedEngine>,
    Path(id): Path<u64>,
) -> Result<Json<RootResponse>, EngineError> {
    let engine = state.lock().await;
    let root = engine.latest(SeriesKey::Distribution(DistributionId(id)))?;
    Ok(Json(root.into()))
}

async fn at(
    State(state): State<SharedEngine>,
    Path(id): Path<u64>,
    Query(q): Query<AtQuery>,
) -> Result<Json<RootResponse>, EngineError> {
    let engine = state.lock().await;
    let root = engine.at(SeriesKey::Distribution(DistributionId(id)), Timestamp(q.timestamp))?;
    Ok(Json(root.into()))
}

// --- Default series ---

async fn get_default(State(state): State<SharedEngine>) -> Result<Json<SeriesResponse>, EngineError> {
    let engine = state.lock().await;
    Ok(Json(SeriesResponse::from(engine.series(SeriesKey::Default)?)))
}

async fn publish_default(
    State(state): State<SharedEngine>,
    caller: Caller,
    Json(req): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, EngineError> {
    let caller = principal(&caller);
    let root = parse_root(&req.root)?;
    let mut engine = state.lock().await;
    let receipt = engine.publish_default(caller.as_ref(), root, Timestamp(req.end_timestamp))?;
    Ok(Json(receipt.into()))
}

async fn latest_default(State(state): State<SharedEngine>) -> Result<Json<RootResponse>, EngineError> {
    let engine = state.lock().await;
    Ok(Json(engine.latest(SeriesKey::Default)?.into()))
}

async fn at_default(
    State(state): State<SharedEngine>,
    Query(q): Query<AtQuery>,
) -> Result<Json<RootResponse>, EngineError> {
    let engine = state.lock().await;
    Ok(Json(engine.at(SeriesKey::Default, Timestamp(q.timestamp))?.into()))
}

// --- Notifications ---

/// Newline-delimited JSON, one line per committed creation or publish from
/// the moment of subscription. Lagging subscribers skip what they missed.
async fn event_stream(State(state): State<SharedEngine>) -> Body {
    let rx = {
        let engine = state.lock().await;
        engine.subscribe()
    };

    let stream = BroadcastStream::new(rx).filter_map(|item| async move {
        match item {
            Ok(notification) => {
                let view = NotificationView::from(&notification);
                serde_json::to_string(&view)
                    .ok()
                    .map(|line| Ok::<_, std::convert::Infallible>(format!("{}\n", line)))
            }
            Err(e) => {
                tracing::warn!("Event stream subscriber lagged: {}", e);
                None
            }
        }
    });

    Body::from_stream(stream)
}

// --- Audit & admin ---

async fn get_proof(State(state): State<SharedEngine>) -> Result<Json<LedgerProofView>, EngineError> {
    let engine = state.lock().await;
    let proof = engine.proof()?;
    Ok(Json(LedgerProofView::from(&proof)))
}

async fn snapshot_save(
    State(state): State<SharedEngine>,
    caller: Caller,
) -> Result<Json<SnapshotSaveResponse>, EngineError> {
    let engine = state.lock().await;
    engine.require_admin(principal(&caller).as_ref())?;
    let info = engine.save_snapshot()?;
    Ok(Json(info.into()))
}

async fn download_log(State(state): State<SharedEngine>) -> Result<Body, EngineError> {
    let path = {
        let engine = state.lock().await;
        engine.event_log_path().map(|p| p.to_path_buf())
    }
    .ok_or(EngineError::InvalidInput("No event log configured for this node".into()))?;

    let file = tokio::fs::File::open(&path).await?;
    Ok(Body::from_stream(ReaderStream::new(file)))
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}
