//! Route table and middleware stack.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers;
use crate::state::AppState;

/// Bare route table.
pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route("/upload", post(handlers::upload))
    .route("/logs", get(handlers::list_logs))
    .route("/logs/mark-read", post(handlers::mark_read))
    .route("/logs/:id", get(handlers::get_log))
    .route("/groups/:tf_req_id", get(handlers::group))
    .route("/timeline", get(handlers::timeline))
    .route("/metrics", get(handlers::metrics))
    .route("/export/download", post(handlers::export_download))
    .route("/corrupted-logs", get(handlers::corrupted_logs))
    .with_state(state)
}

/// Routes plus body limit, CORS and request tracing.
pub fn app(state: Arc<AppState>, config: &ServerConfig) -> Router {
  router(state)
    .layer(DefaultBodyLimit::max(config.max_upload_bytes))
    .layer(cors_layer(&config.cors_origins))
    .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  let allowed: Vec<HeaderValue> = origins
    .iter()
    .filter_map(|o| match o.parse() {
      Ok(v) => Some(v),
      Err(_) => {
        tracing::warn!(origin = %o, "skipping invalid CORS origin");
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(allowed))
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE])
    .expose_headers([header::CONTENT_DISPOSITION])
}
