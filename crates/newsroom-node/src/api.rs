//! HTTP API.
//!
//! `GET /health` is served directly. Every other request goes through one
//! fallback handler that hands `(method, path, body)` to the
//! [`Dispatcher`] and turns the [`Reply`] into a response.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderName, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use newsroom_core::{ContentStore, Dispatcher, Reply, Status};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::observability::request_id_layer;
use crate::persistence::SnapshotGateway;

/// How long browsers may cache a preflight answer.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Request dispatcher over the content store.
    pub dispatcher: Dispatcher,
    /// Where snapshots go after each mutation.
    pub snapshots: Arc<dyn SnapshotGateway>,
}

impl AppState {
    /// Creates state for `store`, saving through `snapshots`.
    pub fn new(store: Arc<ContentStore>, snapshots: Arc<dyn SnapshotGateway>) -> Self {
        Self {
            dispatcher: Dispatcher::new(store),
            snapshots,
        }
    }

    /// The content store.
    pub fn store(&self) -> &Arc<ContentStore> {
        self.dispatcher.store()
    }

    /// Saves a copy of the current database in the background.
    ///
    /// The response does not wait for the save, so two saves started close
    /// together may finish out of order. Failures are logged and dropped.
    fn schedule_save(&self) {
        let snapshot = self.store().snapshot();
        let gateway = Arc::clone(&self.snapshots);

        tokio::spawn(async move {
            if let Err(e) = gateway.save(&snapshot).await {
                tracing::warn!(error = %e, "Failed to save snapshot");
            }
        });
    }
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check; other methods on /health go to the dispatcher.
        .route("/health", get(health_check).fallback(dispatch))
        .fallback(dispatch)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-http-method-override"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .max_age(PREFLIGHT_MAX_AGE)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Dispatches any request that is not the health check.
async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let payload = match decode_body(&method, &body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "Rejecting malformed JSON body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let reply = state.dispatcher.handle(method.as_str(), uri.path(), payload);
    if reply.mutated {
        state.schedule_save();
    }

    reply_response(reply)
}

/// Decodes the JSON body of a POST or PUT. Other methods and empty bodies
/// carry no payload.
fn decode_body(method: &Method, body: &[u8]) -> serde_json::Result<Option<Value>> {
    let has_body = newsroom_core::Method::parse(method.as_str()).is_some_and(|m| m.has_body());
    if !has_body || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some)
}

fn status_code(status: Status) -> StatusCode {
    match status {
        Status::Ok => StatusCode::OK,
        Status::Created => StatusCode::CREATED,
        Status::NoContent => StatusCode::NO_CONTENT,
        Status::BadRequest => StatusCode::BAD_REQUEST,
        Status::NotFound => StatusCode::NOT_FOUND,
    }
}

fn reply_response(reply: Reply) -> Response {
    let status = status_code(reply.status);
    match reply.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}
