//! Request types for the log API.

use log_engine::QueryFilters;
use serde::Deserialize;

/// `GET /logs` query string. Numbers arrive as text so a bad value can be
/// ignored instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct LogsParams {
  pub tf_resource_type: Option<String>,
  pub timestamp_from: Option<String>,
  pub timestamp_to: Option<String>,
  pub level: Option<String>,
  pub search: Option<String>,
  pub page: Option<String>,
  pub limit: Option<String>,
}

impl From<LogsParams> for QueryFilters {
  fn from(p: LogsParams) -> Self {
    QueryFilters {
      tf_resource_type: p.tf_resource_type,
      timestamp_from: p.timestamp_from,
      timestamp_to: p.timestamp_to,
      level: p.level,
      search: p.search,
      page: lenient_int(p.page.as_deref()),
      limit: lenient_int(p.limit.as_deref()),
    }
  }
}

/// Missing or unparseable means 0, which the query engine reads as "default".
fn lenient_int(v: Option<&str>) -> i64 {
  v.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
  #[serde(default)]
  pub ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
  #[serde(default)]
  pub filters: QueryFilters,
}
