//! Profile HTTP Routes
//!
//! - `GET    /filelist`            list stored profile names
//! - `POST   /filelist`            touch the refresh marker
//! - `GET    /files?filename=..`   read one verified profile
//! - `PUT    /files?filename=..`   validate and store one profile
//! - `DELETE /files?filename=..`   remove one profile
//!
//! Any other verb on these paths is answered 405.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, Request, State,
    },
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::errors::{GatewayError, GatewayResult};
use crate::lifecycle::Lifecycle;
use crate::naming::DocumentName;
use crate::observability::Logger;
use crate::store::{DocumentStore, StoreResult};

// ==================
// Shared State
// ==================

/// State shared across handlers
pub struct GatewayState {
    pub store: Arc<DocumentStore>,
    pub refresh_marker: PathBuf,
}

impl GatewayState {
    pub fn new(store: Arc<DocumentStore>, refresh_marker: impl Into<PathBuf>) -> Self {
        Self {
            store,
            refresh_marker: refresh_marker.into(),
        }
    }
}

// ==================
// Request Types
// ==================

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    /// Missing is treated as empty and rejected by the filename guard
    #[serde(default)]
    pub filename: String,
}

// ==================
// Router
// ==================

/// Create profile routes
pub fn gateway_routes(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route(
            "/filelist",
            get(list_files_handler)
                .post(refresh_file_list_handler)
                .fallback(method_not_allowed),
        )
        .route(
            "/files",
            get(read_file_handler)
                .put(write_file_handler)
                .delete(delete_file_handler)
                .fallback(method_not_allowed),
        )
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn list_files_handler(
    State(state): State<Arc<GatewayState>>,
) -> GatewayResult<Json<Vec<String>>> {
    let names = run_blocking(&state.store, |store| {
        store
            .list()?
            .map(|name| name.map(DocumentName::into_string))
            .collect::<StoreResult<Vec<_>>>()
    })
    .await?;

    Ok(Json(names))
}

async fn refresh_file_list_handler(
    State(state): State<Arc<GatewayState>>,
) -> GatewayResult<&'static str> {
    // Touch semantics: create if absent, never truncate.
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&state.refresh_marker)
        .await
        .map_err(|e| {
            GatewayError::Internal(format!(
                "failed to touch {}: {}",
                state.refresh_marker.display(),
                e
            ))
        })?;

    Ok("OK")
}

async fn read_file_handler(
    State(state): State<Arc<GatewayState>>,
    query: Result<Query<FileQuery>, QueryRejection>,
) -> GatewayResult<Response> {
    let Query(query) = query.map_err(|e| GatewayError::BadRequest(e.body_text()))?;

    let document = run_blocking(&state.store, move |store| store.read(&query.filename)).await?;

    Ok((
        [(CONTENT_TYPE, "application/octet-stream")],
        document.into_payload(),
    )
        .into_response())
}

async fn write_file_handler(
    State(state): State<Arc<GatewayState>>,
    query: Result<Query<FileQuery>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResult<&'static str> {
    let Query(query) = query.map_err(|e| GatewayError::BadRequest(e.body_text()))?;
    let body = body.map_err(|e| GatewayError::BadRequest(e.body_text()))?;

    run_blocking(&state.store, move |store| store.write(&query.filename, &body)).await?;

    Ok("OK")
}

async fn delete_file_handler(
    State(state): State<Arc<GatewayState>>,
    query: Result<Query<FileQuery>, QueryRejection>,
) -> GatewayResult<&'static str> {
    let Query(query) = query.map_err(|e| GatewayError::BadRequest(e.body_text()))?;

    run_blocking(&state.store, move |store| store.delete(&query.filename)).await?;

    Ok("OK")
}

async fn method_not_allowed() -> GatewayError {
    GatewayError::MethodNotAllowed
}

/// Runs a store operation on the blocking pool.
///
/// Once started, the operation runs to completion even if the request is
/// dropped.
async fn run_blocking<T, F>(store: &Arc<DocumentStore>, op: F) -> GatewayResult<T>
where
    F: FnOnce(&DocumentStore) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| GatewayError::Internal(format!("store task failed: {}", e)))?
        .map_err(GatewayError::from)
}

// ==================
// Middleware
// ==================

/// Answers 503 to every request once the lifecycle has left `Running`.
pub async fn reject_when_draining(
    State(lifecycle): State<Lifecycle>,
    request: Request,
    next: Next,
) -> Response {
    if !lifecycle.is_running() {
        return GatewayError::ServerBusy.into_response();
    }
    next.run(request).await
}

/// One log line per request: rejected requests at WARN, the rest at INFO.
pub async fn access_log(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let status_text = status.as_u16().to_string();
    let elapsed_us = started.elapsed().as_micros().to_string();
    let fields = [
        ("method", method.as_str()),
        ("path", path.as_str()),
        ("status", status_text.as_str()),
        ("elapsed_us", elapsed_us.as_str()),
    ];
    if status.is_client_error() || status.is_server_error() {
        Logger::warn("REQUEST_REJECTED", &fields);
    } else {
        Logger::info("REQUEST_SERVED", &fields);
    }
    response
}
