//! HTTP surface of the detection service.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use mev_sentry_heuristics::{DetectionEngine, Trace, Verdict, VerdictReason};
use mev_sentry_telemetry::{
    audit::{self, AuditRecord},
    Metrics,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::document;
use crate::validation::validate_request;

/// Detection request envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRequest {
    pub id: Option<String>,
    pub detector_name: Option<String>,
    pub chain_id: u64,
    pub hash: Option<String>,
    pub protocol_name: Option<String>,
    pub protocol_address: Option<String>,
    pub trace: Trace,
}

/// Detection response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub request_id: Option<String>,
    pub chain_id: u64,
    pub protocol_address: Option<String>,
    pub protocol_name: Option<String>,
    pub detected: bool,
    pub message: String,
    pub reason: VerdictReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResponse {
    pub fn new(request: &DetectionRequest, verdict: Verdict) -> Self {
        Self {
            request_id: request.id.clone(),
            chain_id: request.chain_id,
            protocol_address: request.protocol_address.clone(),
            protocol_name: request.protocol_name.clone(),
            detected: verdict.detected,
            message: verdict.message,
            reason: verdict.reason,
            error: None,
        }
    }
}

/// Shared state of the HTTP handlers.
pub struct AppState {
    pub engine: DetectionEngine,
    pub metrics: Metrics,
    pub sample_output_path: Option<PathBuf>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/detect", post(detect))
        .route("/app/health-check", get(health_check))
        .route("/app/version", get(version))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(bind_address: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Detection service listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    info!("Detection service stopped");
    Ok(())
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
}

async fn detect(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let parsed = match document::parse_document(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Rejected detection request: {}", e);
            return bad_request(e.to_string());
        }
    };

    let issues = validate_request(&parsed);
    document::dismantle(parsed);
    if !issues.is_empty() {
        let message = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        warn!("Rejected detection request: {}", message);
        return bad_request(message);
    }

    let request: DetectionRequest = match document::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return bad_request(e.to_string()),
    };

    let verdict = state.engine.classify(&request.trace).await;
    state.metrics.record_verdict(verdict.reason.as_str());
    info!(
        "Classified request {} (tx {}, detector {}) on chain {}: detected={} reason={}",
        request.id.as_deref().unwrap_or("-"),
        request.hash.as_deref().unwrap_or("-"),
        request.detector_name.as_deref().unwrap_or("-"),
        request.chain_id,
        verdict.detected,
        verdict.reason.as_str()
    );

    if let Some(path) = state.sample_output_path.clone() {
        let record = AuditRecord {
            request_id: request.id.clone(),
            chain_id: Some(request.chain_id),
            origin: request.trace.from.clone(),
            detected: verdict.detected,
            reason: verdict.reason.as_str().to_string(),
            flattened_calls: request.trace.node_count(),
            evaluated_at: Utc::now(),
        };
        let write = tokio::task::spawn_blocking(move || audit::write_audit_sample(Some(path), &record));
        match write.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to write audit sample: {}", e),
            Err(e) => warn!("Audit sample task failed: {}", e),
        }
    }

    Json(DetectionResponse::new(&request, verdict)).into_response()
}

async fn health_check() -> Json<Value> {
    Json(json!({ "message": "OK" }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, StatusCode> {
    match state.metrics.gather() {
        Ok(body) => Ok((StatusCode::OK, body)),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
