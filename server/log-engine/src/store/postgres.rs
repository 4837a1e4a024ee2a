//! PostgreSQL record store.
//!
//! One wide `log_records` table keyed by identity. First-class fields are
//! nullable columns (correlation id and event time indexed); the open field
//! bag lives in a `jsonb` column.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::{EngineError, Result};
use crate::store::{RecordPredicate, RecordStore};
use crate::types::{Record, Severity};

/// Idempotent schema bootstrap.
pub const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS log_records (
    id TEXT PRIMARY KEY,
    event_timestamp TEXT,
    event_time TIMESTAMPTZ,
    tf_req_id TEXT,
    tf_resource_type TEXT,
    severity TEXT NOT NULL DEFAULT 'info',
    fields JSONB NOT NULL DEFAULT '{}'::jsonb,
    read BOOLEAN NOT NULL DEFAULT FALSE,
    repaired BOOLEAN NOT NULL DEFAULT FALSE
);
CREATE INDEX IF NOT EXISTS log_records_tf_req_id_idx ON log_records (tf_req_id);
CREATE INDEX IF NOT EXISTS log_records_event_time_idx ON log_records (event_time);
CREATE TABLE IF NOT EXISTS corrupted_lines (
    seq BIGSERIAL PRIMARY KEY,
    line TEXT NOT NULL,
    received_at TIMESTAMPTZ NOT NULL DEFAULT now()
);";

/// Column list for `log_records` reads.
const COLUMNS: &str = "id, event_timestamp, tf_req_id, severity, fields, read, repaired";

const UPSERT: &str = "\
    INSERT INTO log_records \
      (id, event_timestamp, event_time, tf_req_id, tf_resource_type, severity, fields, read, repaired) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
    ON CONFLICT (id) DO UPDATE SET \
      event_timestamp = EXCLUDED.event_timestamp, \
      event_time = EXCLUDED.event_time, \
      tf_req_id = EXCLUDED.tf_req_id, \
      tf_resource_type = EXCLUDED.tf_resource_type, \
      severity = EXCLUDED.severity, \
      fields = EXCLUDED.fields, \
      read = EXCLUDED.read, \
      repaired = EXCLUDED.repaired";

/// Row shape of `log_records` as read back.
#[derive(Debug, sqlx::FromRow)]
pub struct RecordRow {
  pub id: String,
  pub event_timestamp: Option<String>,
  pub tf_req_id: Option<String>,
  pub severity: String,
  pub fields: Json<Map<String, Value>>,
  pub read: bool,
  pub repaired: bool,
}

impl From<RecordRow> for Record {
  fn from(row: RecordRow) -> Self {
    Record {
      id: row.id,
      event_timestamp: row.event_timestamp,
      correlation_id: row.tf_req_id,
      severity: Severity::from_str_loose(&row.severity).unwrap_or_default(),
      read: row.read,
      repaired: row.repaired,
      fields: row.fields.0,
    }
  }
}

/// Store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
  pool: PgPool,
  round_trip_timeout: Duration,
}

impl PgRecordStore {
  pub fn new(pool: PgPool, round_trip_timeout: Duration) -> Self {
    Self {
      pool,
      round_trip_timeout,
    }
  }

  /// Connect a small pool to `database_url`.
  pub async fn connect(database_url: &str, round_trip_timeout: Duration) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(10)
      .acquire_timeout(round_trip_timeout)
      .connect(database_url)
      .await?;
    Ok(Self::new(pool, round_trip_timeout))
  }

  /// Create tables and indexes if they do not exist.
  pub async fn bootstrap(&self) -> Result<()> {
    self
      .bounded(sqlx::raw_sql(SCHEMA).execute(&self.pool))
      .await?;
    tracing::info!("log_records schema ready");
    Ok(())
  }

  /// Run one database round trip under the configured deadline.
  async fn bounded<T, F>(&self, fut: F) -> Result<T>
  where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
  {
    match tokio::time::timeout(self.round_trip_timeout, fut).await {
      Ok(res) => res.map_err(EngineError::from),
      Err(_) => Err(EngineError::Timeout(self.round_trip_timeout)),
    }
  }

  /// Any failed statement returns early and drops `tx`, rolling back the
  /// records and corrupted lines of the upload together.
  async fn upsert_all(&self, records: &[Record], corrupted: &[String]) -> Result<()> {
    let mut tx = self.bounded(self.pool.begin()).await?;
    for record in records {
      let event_time: Option<DateTime<Utc>> = record.event_time();
      self
        .bounded(
          sqlx::query(UPSERT)
            .bind(&record.id)
            .bind(record.event_timestamp.as_deref())
            .bind(event_time)
            .bind(record.correlation_id.as_deref())
            .bind(record.resource_type())
            .bind(record.severity.as_str())
            .bind(Json(&record.fields))
            .bind(record.read)
            .bind(record.repaired)
            .execute(&mut *tx),
        )
        .await?;
    }
    for line in corrupted {
      self
        .bounded(
          sqlx::query("INSERT INTO corrupted_lines (line) VALUES ($1)")
            .bind(line)
            .execute(&mut *tx),
        )
        .await?;
    }
    self.bounded(tx.commit()).await
  }
}

#[async_trait]
impl RecordStore for PgRecordStore {
  async fn put_batch(&self, records: Vec<Record>, corrupted: Vec<String>) -> Result<()> {
    if records.is_empty() && corrupted.is_empty() {
      return Ok(());
    }
    self.upsert_all(&records, &corrupted).await.map_err(|e| {
      tracing::warn!(
        error = %e,
        records = records.len(),
        corrupted = corrupted.len(),
        "batch rolled back"
      );
      e
    })
  }

  async fn get(&self, id: &str) -> Result<Record> {
    let query = format!("SELECT {COLUMNS} FROM log_records WHERE id = $1");
    let row = self
      .bounded(
        sqlx::query_as::<_, RecordRow>(&query)
          .bind(id)
          .fetch_optional(&self.pool),
      )
      .await?;
    row.map(Record::from).ok_or_else(|| EngineError::not_found(id))
  }

  async fn toggle_read(&self, ids: &[String]) -> Result<()> {
    if ids.is_empty() {
      return Ok(());
    }
    self
      .bounded(
        sqlx::query("UPDATE log_records SET read = NOT read WHERE id = ANY($1)")
          .bind(ids)
          .execute(&self.pool),
      )
      .await?;
    Ok(())
  }

  async fn all_matching(&self, predicate: RecordPredicate<'_>) -> Result<Vec<Record>> {
    let query = format!("SELECT {COLUMNS} FROM log_records");
    let rows = self
      .bounded(sqlx::query_as::<_, RecordRow>(&query).fetch_all(&self.pool))
      .await?;
    Ok(rows.into_iter().map(Record::from).filter(|r| predicate(r)).collect())
  }

  async fn group_by_correlation(&self, correlation_id: &str) -> Result<Vec<Record>> {
    let query = format!(
      "SELECT {COLUMNS} FROM log_records WHERE tf_req_id = $1 \
       ORDER BY event_time ASC NULLS FIRST, id ASC"
    );
    let rows = self
      .bounded(
        sqlx::query_as::<_, RecordRow>(&query)
          .bind(correlation_id)
          .fetch_all(&self.pool),
      )
      .await?;
    Ok(rows.into_iter().map(Record::from).collect())
  }

  async fn list_corrupted(&self) -> Result<Vec<String>> {
    self
      .bounded(
        sqlx::query_scalar::<_, String>("SELECT line FROM corrupted_lines ORDER BY seq")
          .fetch_all(&self.pool),
      )
      .await
  }

  async fn len(&self) -> Result<usize> {
    let count = self
      .bounded(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM log_records").fetch_one(&self.pool),
      )
      .await?;
    Ok(usize::try_from(count).unwrap_or(0))
  }
}
