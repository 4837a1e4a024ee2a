//! Structured error types for the log engine.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced to callers of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("decode: {0}")]
  Decode(String),

  #[error("record not found: {0}")]
  NotFound(String),

  #[error("storage: {0}")]
  Storage(#[from] sqlx::Error),

  #[error("storage: round trip exceeded {0:?}")]
  Timeout(Duration),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl EngineError {
  pub fn decode(msg: impl Into<String>) -> Self {
    Self::Decode(msg.into())
  }

  pub fn not_found(id: impl Into<String>) -> Self {
    Self::NotFound(id.into())
  }
}

/// Why a single input line could not be turned into a record.
///
/// Absorbed by the decoder; never returned from ingestion.
#[derive(Debug, Error)]
pub enum LineError {
  #[error("parse: {0}")]
  ParseFailure(#[from] serde_json::Error),

  #[error("schema: {field}: {reason}")]
  Schema { field: String, reason: String },

  #[error("line exceeds {limit} bytes")]
  TooLong { limit: usize },
}

impl LineError {
  pub fn schema(field: &str, reason: &str) -> Self {
    Self::Schema {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }
}

/// The repair pass could not produce a candidate document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepairFailure {
  #[error("empty line")]
  Empty,

  #[error("no object start")]
  NoObject,

  #[error("repaired text still invalid")]
  StillInvalid,
}

pub type Result<T> = std::result::Result<T, EngineError>;
