//! # REST API
//!
//! Builds the axum router that exposes a ledger over HTTP. All endpoints
//! share one [`SharedChain`] through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Liveness check                           |
//! | GET    | `/status`         | Chain id, algorithm, length, seal state  |
//! | GET    | `/records`        | Every record, genesis first              |
//! | GET    | `/records/:index` | One record                               |
//! | POST   | `/records`        | Append the JSON body as a new record     |
//! | POST   | `/seal`           | Seal the chain (idempotent)              |
//! | GET    | `/verify`         | Full integrity report                    |

use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sealchain_ledger::{ChainSnapshot, LedgerError, LedgerResult, SealOutcome, SharedChain};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone; everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The ledger being served.
    pub chain: SharedChain,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Snapshot file every mutation is committed to, if any.
    pub store: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        version: String,
        chain: SharedChain,
        metrics: SharedMetrics,
        store: Option<PathBuf>,
    ) -> Self {
        let state = Self {
            version,
            chain,
            metrics,
            store,
        };
        state.refresh_chain_gauges();
        state
    }

    /// Set the length and seal gauges from one consistent view of the chain.
    fn refresh_chain_gauges(&self) {
        self.chain
            .with_read(|chain| self.metrics.observe_chain(chain.len(), chain.is_sealed()));
    }

    /// Run a committed mutation on the blocking pool.
    ///
    /// The snapshot write (create, fsync, rename) happens inside `mutate`
    /// under the chain's write lock, so it must stay off the async workers.
    async fn mutate_blocking<T, F>(&self, mutate: F) -> Result<LedgerResult<T>, JoinError>
    where
        T: Send + 'static,
        F: FnOnce(&SharedChain, Option<&std::path::Path>) -> LedgerResult<T> + Send + 'static,
    {
        let chain = self.chain.clone();
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || mutate(&chain, store.as_deref())).await
    }
}

/// Write `snapshot` to the store, if one is configured.
fn commit_to_store(store: Option<&std::path::Path>, snapshot: &ChainSnapshot) -> LedgerResult<()> {
    match store {
        Some(path) => snapshot.save(path),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/records", get(list_records_handler).post(append_handler))
        .route("/records/:index", get(record_by_index_handler))
        .route("/seal", post(seal_handler))
        .route("/verify", get(verify_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Chain identity bound into the genesis record.
    pub chain_id: String,
    /// Hash algorithm the chain was built with.
    pub algorithm: String,
    /// Number of records, genesis included.
    pub length: usize,
    /// Whether the chain is sealed.
    pub sealed: bool,
    /// Hash of the latest record.
    pub tip_hash: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `POST /seal`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SealResponse {
    pub outcome: SealOutcome,
    pub length: usize,
}

/// Generic error body returned on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Map a ledger error to an HTTP status.
fn ledger_error_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::AlreadySealed { .. } => StatusCode::CONFLICT,
        LedgerError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 while the process is up.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — chain summary, read from one consistent view.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = state.chain.with_read(|chain| StatusResponse {
        version: state.version.clone(),
        chain_id: chain.id().to_string(),
        algorithm: chain.algorithm().to_string(),
        length: chain.len(),
        sealed: chain.is_sealed(),
        tip_hash: chain.tip().hash.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    });
    Json(resp)
}

/// `GET /records` — every record, genesis first.
async fn list_records_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.chain.records())
}

/// `GET /records/:index` — one record, or 404.
async fn record_by_index_handler(
    State(state): State<AppState>,
    Path(index): Path<u64>,
) -> Response {
    match state.chain.get(index) {
        Some(record) => Json(record).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("record {} not found", index),
        ),
    }
}

/// `POST /records` — append the JSON body.
///
/// 201 with the new record; 409 once sealed; 413 when the payload exceeds
/// the chain's limit. With a store configured the record is only applied
/// after the snapshot write succeeds, so a 500 means nothing was appended.
async fn append_handler(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let result = state
        .mutate_blocking(move |chain, store| {
            chain.append_committed(payload, |snapshot| commit_to_store(store, snapshot))
        })
        .await;

    let record = match result {
        Ok(Ok(record)) => record,
        Ok(Err(e)) => {
            let status = ledger_error_status(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!("append not persisted: {}", e);
                return error_response(status, format!("record not appended: {}", e));
            }
            state.metrics.appends_rejected_total.inc();
            return error_response(status, e.to_string());
        }
        Err(e) => {
            tracing::error!("append task failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "append task failed");
        }
    };

    state.metrics.records_appended_total.inc();
    state.refresh_chain_gauges();

    tracing::info!(index = record.index, hash = %record.hash, "record appended");
    (StatusCode::CREATED, Json(record)).into_response()
}

/// `POST /seal` — seal the chain. Repeat calls report `already_sealed`.
///
/// With a store configured the chain only counts as sealed once the sealed
/// snapshot is on disk; after a 500 the chain is still open and a retry
/// writes it again.
async fn seal_handler(State(state): State<AppState>) -> Response {
    let result = state
        .mutate_blocking(|chain, store| {
            chain.seal_committed(|snapshot| commit_to_store(store, snapshot))
        })
        .await;

    let outcome = match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::error!("seal not persisted: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("chain not sealed: {}", e),
            );
        }
        Err(e) => {
            tracing::error!("seal task failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "seal task failed");
        }
    };

    state.refresh_chain_gauges();
    let length = state.chain.len();
    Json(SealResponse { outcome, length }).into_response()
}

/// `GET /verify` — full integrity walk.
async fn verify_handler(State(state): State<AppState>) -> impl IntoResponse {
    let timer = state.metrics.verify_duration_seconds.start_timer();
    let report = state.chain.verify_integrity();
    timer.observe_duration();

    state.metrics.verifications_total.inc();
    if !report.valid {
        state.metrics.integrity_failures_total.inc();
    }
    Json(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
