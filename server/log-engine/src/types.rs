//! Core types for the log engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::time::parse_event_time;

// ---------------------------------------------------------------------------
// Severity enum (normalized)
// ---------------------------------------------------------------------------

/// Canonical severity. Variant order is the escalation order.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Trace,
  Debug,
  #[default]
  Info,
  Warning,
  Error,
}

impl Severity {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "trace" => Some(Self::Trace),
      "debug" => Some(Self::Debug),
      "info" | "information" | "notice" => Some(Self::Info),
      "warning" | "warn" => Some(Self::Warning),
      "error" | "err" | "fatal" | "critical" | "crit" => Some(Self::Error),
      _ => None,
    }
  }

  /// Integer level codes used by some producers: 0 info, 1 warn, 2 error.
  pub fn from_code(code: i64) -> Self {
    match code {
      1 => Self::Warning,
      2 => Self::Error,
      _ => Self::Info,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Trace => "trace",
      Self::Debug => "debug",
      Self::Info => "info",
      Self::Warning => "warning",
      Self::Error => "error",
    }
  }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One ingested log line.
///
/// A handful of first-class fields are lifted out of the input; every other
/// key is carried verbatim in `fields`, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub id: String,
  #[serde(rename = "@timestamp", default, skip_serializing_if = "Option::is_none")]
  pub event_timestamp: Option<String>,
  #[serde(rename = "tf_req_id", default, skip_serializing_if = "Option::is_none")]
  pub correlation_id: Option<String>,
  #[serde(default)]
  pub severity: Severity,
  #[serde(default)]
  pub read: bool,
  #[serde(default)]
  pub repaired: bool,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

impl Record {
  /// Parsed event time, if the record has a usable `@timestamp`.
  pub fn event_time(&self) -> Option<DateTime<Utc>> {
    self.event_timestamp.as_deref().and_then(parse_event_time)
  }

  /// String value of a bag field; non-string values yield `None`.
  pub fn field_str(&self, name: &str) -> Option<&str> {
    self.fields.get(name).and_then(Value::as_str)
  }

  pub fn resource_type(&self) -> Option<&str> {
    self.field_str("tf_resource_type")
  }
}

// ---------------------------------------------------------------------------
// Query filters (JSON contract: what the caller sends)
// ---------------------------------------------------------------------------

/// Query options. Absent or unusable values mean "no constraint".
///
/// Deserialization never fails on a field's value: a mistyped text filter is
/// dropped and a mistyped number reads as 0 (the default).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryFilters {
  #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
  pub tf_resource_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
  pub timestamp_from: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
  pub timestamp_to: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
  pub level: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_text")]
  pub search: Option<String>,
  /// 1-based; values <= 0 mean the first page.
  #[serde(deserialize_with = "lenient_int")]
  pub page: i64,
  /// Values <= 0 mean the configured default page size.
  #[serde(deserialize_with = "lenient_int")]
  pub limit: i64,
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
  Ok(match Value::deserialize(d)? {
    Value::String(s) => Some(s),
    _ => None,
  })
}

/// Accepts a JSON integer or a numeric string.
fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
  Ok(match Value::deserialize(d)? {
    Value::Number(n) => n.as_i64().unwrap_or(0),
    Value::String(s) => s.trim().parse().unwrap_or(0),
    _ => 0,
  })
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: what we emit)
// ---------------------------------------------------------------------------

/// Result of one ingestion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
  pub id: String,
  pub status: String,
  pub records: usize,
  pub repaired: usize,
  pub corrupted: usize,
}

/// Per-correlation-id summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
  pub tf_req_id: String,
  pub start: String,
  pub end: String,
  pub status: Severity,
  pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
  pub errors: u64,
  pub warnings: u64,
  pub levels: BTreeMap<Severity, u64>,
}

impl Metrics {
  pub fn total(&self) -> u64 {
    self.levels.values().sum()
  }
}
