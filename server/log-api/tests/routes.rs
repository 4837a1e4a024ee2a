//! Route-level tests: build the app over an in-memory service and drive it
//! with `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use log_api::{AppState, ServerConfig};
use log_engine::LogService;
use serde_json::{json, Value};
use tower::ServiceExt;

const UPLOAD: &str = concat!(
  r#"{"id":"a","@timestamp":"2025-01-15T10:00:00Z","tf_req_id":"r1","@level":"info","tf_resource_type":"t1_vpc"}"#,
  "\n",
  r#"{"id":"b","@timestamp":"2025-01-15T10:05:00Z","tf_req_id":"r1","@level":"error","tf_resource_type":"t1_vpc"}"#,
  "\n",
  r#"{"id":"c","@level":"warn",}"#,
  "\n",
);

fn test_config() -> ServerConfig {
  ServerConfig::from_lookup(|name| match name {
    "MAX_UPLOAD_BYTES" => Some("4096".into()),
    _ => None,
  })
  .unwrap()
}

fn build_app() -> Router {
  let config = test_config();
  let service = LogService::in_memory(config.engine.clone());
  log_api::app(Arc::new(AppState::new(service)), &config)
}

async fn send(app: &Router, req: Request<Body>) -> Response {
  app.clone().oneshot(req).await.unwrap()
}

async fn get(app: &Router, uri: &str) -> Response {
  send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
  let req = Request::builder()
    .method(Method::POST)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap();
  send(app, req).await
}

async fn upload_raw(app: &Router, body: impl Into<Body>) -> Response {
  let req = Request::post("/upload")
    .header(header::CONTENT_TYPE, "application/octet-stream")
    .body(body.into())
    .unwrap();
  send(app, req).await
}

async fn body_json(resp: Response) -> Value {
  let bytes = resp.into_body().collect().await.unwrap().to_bytes();
  serde_json::from_slice(&bytes).unwrap()
}

fn ids(v: &Value) -> Vec<&str> {
  v.as_array()
    .unwrap()
    .iter()
    .map(|r| r["id"].as_str().unwrap())
    .collect()
}

#[tokio::test]
async fn health_returns_ok() {
  let app = build_app();
  let resp = get(&app, "/health").await;
  assert_eq!(resp.status(), StatusCode::OK);
  let bytes = resp.into_body().collect().await.unwrap().to_bytes();
  assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn raw_upload_returns_receipt() {
  let app = build_app();
  let resp = upload_raw(&app, UPLOAD).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let receipt = body_json(resp).await;
  assert_eq!(receipt["status"], "parsed");
  assert_eq!(receipt["records"], 3);
  assert_eq!(receipt["repaired"], 1);
  assert_eq!(receipt["corrupted"], 1);
}

#[tokio::test]
async fn multipart_upload_reads_file_field() {
  let app = build_app();
  let boundary = "XBOUNDARYX";
  let body = format!(
    "--{boundary}\r\n\
     Content-Disposition: form-data; name=\"file\"; filename=\"logs.json\"\r\n\
     Content-Type: application/json\r\n\r\n\
     {UPLOAD}\r\n\
     --{boundary}--\r\n"
  );
  let req = Request::post("/upload")
    .header(
      header::CONTENT_TYPE,
      format!("multipart/form-data; boundary={boundary}"),
    )
    .body(Body::from(body))
    .unwrap();

  let resp = send(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await["records"], 3);
}

#[tokio::test]
async fn multipart_without_file_field_is_bad_request() {
  let app = build_app();
  let body = "--B\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--B--\r\n";
  let req = Request::post("/upload")
    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=B")
    .body(Body::from(body))
    .unwrap();
  assert_eq!(send(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_utf8_upload_is_bad_request() {
  let app = build_app();
  let resp = upload_raw(&app, vec![0xffu8, 0xfe, b'{']).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
  let app = build_app();
  let resp = upload_raw(&app, "x".repeat(8192)).await;
  assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn logs_are_newest_first_and_filterable() {
  let app = build_app();
  upload_raw(&app, UPLOAD).await;

  let all = body_json(get(&app, "/logs").await).await;
  assert_eq!(ids(&all), vec!["b", "a", "c"]);

  let errors = body_json(get(&app, "/logs?level=ERROR").await).await;
  assert_eq!(ids(&errors), vec!["b"]);

  let paged = body_json(get(&app, "/logs?page=2&limit=1").await).await;
  assert_eq!(ids(&paged), vec!["a"]);

  let beyond = body_json(get(&app, "/logs?page=9&limit=10").await).await;
  assert!(beyond.as_array().unwrap().is_empty());

  let lenient = get(&app, "/logs?page=abc&limit=-").await;
  assert_eq!(lenient.status(), StatusCode::OK);
  assert_eq!(body_json(lenient).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn get_log_found_and_missing() {
  let app = build_app();
  upload_raw(&app, UPLOAD).await;

  let resp = get(&app, "/logs/a").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await["severity"], "info");

  assert_eq!(get(&app, "/logs/zzz").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mark_read_toggles() {
  let app = build_app();
  upload_raw(&app, UPLOAD).await;

  let resp = post_json(&app, "/logs/mark-read", json!({"ids": ["a", "ghost"]})).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  assert_eq!(body_json(get(&app, "/logs/a").await).await["read"], true);

  post_json(&app, "/logs/mark-read", json!({"ids": ["a"]})).await;
  assert_eq!(body_json(get(&app, "/logs/a").await).await["read"], false);
}

#[tokio::test]
async fn mark_read_rejects_empty_or_invalid() {
  let app = build_app();
  let empty = post_json(&app, "/logs/mark-read", json!({"ids": []})).await;
  assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

  let invalid = post_json(&app, "/logs/mark-read", json!({"ids": "a"})).await;
  assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn group_timeline_metrics() {
  let app = build_app();
  upload_raw(&app, UPLOAD).await;

  let group = body_json(get(&app, "/groups/r1").await).await;
  assert_eq!(ids(&group), vec!["a", "b"]);

  let timeline = body_json(get(&app, "/timeline").await).await;
  assert_eq!(
    timeline,
    json!([{
      "tf_req_id": "r1",
      "start": "2025-01-15T10:00:00Z",
      "end": "2025-01-15T10:05:00Z",
      "status": "error",
      "count": 2
    }])
  );

  let metrics = body_json(get(&app, "/metrics").await).await;
  assert_eq!(metrics["errors"], 1);
  assert_eq!(metrics["warnings"], 1);
  assert_eq!(metrics["levels"]["info"], 1);
}

#[tokio::test]
async fn export_is_an_attachment() {
  let app = build_app();
  upload_raw(&app, UPLOAD).await;

  let resp = post_json(
    &app,
    "/export/download",
    json!({"filters": {"tf_resource_type": "t1_vpc"}}),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
  assert_eq!(disposition, "attachment; filename=\"logs_export.json\"");
  assert_eq!(ids(&body_json(resp).await), vec!["b", "a"]);
}

#[tokio::test]
async fn export_ignores_mistyped_filters() {
  let app = build_app();
  upload_raw(&app, UPLOAD).await;

  let resp = post_json(
    &app,
    "/export/download",
    json!({"filters": {"page": "abc", "limit": "10", "level": 7}}),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(ids(&body_json(resp).await), vec!["b", "a", "c"]);
}

#[tokio::test]
async fn corrupted_logs_listed() {
  let app = build_app();
  upload_raw(&app, UPLOAD).await;

  let corrupted = body_json(get(&app, "/corrupted-logs").await).await;
  assert_eq!(corrupted, json!([r#"{"id":"c","@level":"warn",}"#]));
}

#[tokio::test]
async fn cors_allows_dev_origin() {
  let app = build_app();
  let req = Request::get("/health")
    .header(header::ORIGIN, "http://localhost:5173")
    .body(Body::empty())
    .unwrap();
  let resp = send(&app, req).await;
  assert_eq!(
    resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
    "http://localhost:5173"
  );
}
