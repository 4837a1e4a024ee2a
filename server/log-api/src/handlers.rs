//! HTTP handlers for the log API.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use log_engine::{Metrics, QueryFilters, Record, TimelineEntry, UploadReceipt};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{ExportRequest, LogsParams, MarkReadRequest};

/// Multipart form field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";
const EXPORT_FILENAME: &str = "logs_export.json";

pub async fn health() -> &'static str {
  "ok"
}

/// Accepts either a multipart form with a `file` field or the raw file as
/// the request body.
pub async fn upload(
  State(state): State<Arc<AppState>>,
  req: Request,
) -> ApiResult<Json<UploadReceipt>> {
  let is_multipart = req
    .headers()
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|ct| ct.starts_with("multipart/form-data"));

  let bytes = if is_multipart {
    let mut form = Multipart::from_request(req, &()).await?;
    file_field(&mut form).await?
  } else {
    Bytes::from_request(req, &()).await?
  };

  let receipt = state.service.ingest(&bytes).await?;
  Ok(Json(receipt))
}

async fn file_field(form: &mut Multipart) -> ApiResult<Bytes> {
  while let Some(field) = form.next_field().await? {
    if field.name() == Some(UPLOAD_FIELD) {
      return Ok(field.bytes().await?);
    }
  }
  Err(ApiError::BadRequest(format!(
    "multipart form has no `{UPLOAD_FIELD}` field"
  )))
}

pub async fn list_logs(
  State(state): State<Arc<AppState>>,
  Query(params): Query<LogsParams>,
) -> ApiResult<Json<Vec<Record>>> {
  let filters = QueryFilters::from(params);
  Ok(Json(state.service.query(&filters).await?))
}

pub async fn get_log(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<Json<Record>> {
  Ok(Json(state.service.get(&id).await?))
}

pub async fn mark_read(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<MarkReadRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
  let Json(req) = payload?;
  if req.ids.is_empty() {
    return Err(ApiError::BadRequest("ids must not be empty".into()));
  }
  state.service.toggle_read(&req.ids).await?;
  tracing::debug!(ids = req.ids.len(), "read flags toggled");
  Ok(StatusCode::NO_CONTENT)
}

pub async fn group(
  State(state): State<Arc<AppState>>,
  Path(tf_req_id): Path<String>,
) -> ApiResult<Json<Vec<Record>>> {
  Ok(Json(state.service.group(&tf_req_id).await?))
}

pub async fn timeline(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<TimelineEntry>>> {
  Ok(Json(state.service.timelines().await?))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> ApiResult<Json<Metrics>> {
  Ok(Json(state.service.metrics().await?))
}

pub async fn export_download(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<ExportRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
  let Json(req) = payload?;
  let body = state.service.export(&req.filters).await?;
  let disposition = format!("attachment; filename=\"{EXPORT_FILENAME}\"");
  Ok((
    [
      (header::CONTENT_TYPE, "application/json".to_string()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    body,
  ))
}

pub async fn corrupted_logs(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<String>>> {
  Ok(Json(state.service.corrupted().await?))
}
