//! Service facade: binds a record store to the decoder, query engine and
//! aggregator. Transports talk to this and nothing else.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use crate::decode::decode;
use crate::error::Result;
use crate::query;
use crate::stats;
use crate::store::{MemoryStore, RecordStore};
use crate::types::{Metrics, QueryFilters, Record, TimelineEntry, UploadReceipt};

/// Status reported for every accepted upload.
pub const STATUS_PARSED: &str = "parsed";

/// Shared handle over one store. Cloning is cheap.
#[derive(Clone)]
pub struct LogService {
  store: Arc<dyn RecordStore>,
  config: Config,
}

impl LogService {
  pub fn new(store: Arc<dyn RecordStore>, config: Config) -> Self {
    Self { store, config }
  }

  /// Service over a fresh in-memory store.
  pub fn in_memory(config: Config) -> Self {
    Self::new(Arc::new(MemoryStore::new()), config)
  }

  pub fn with_defaults() -> Self {
    Self::in_memory(Config::default())
  }

  /// Decode an upload and persist what survives.
  ///
  /// Records and corrupted lines are written as one batch, so a storage
  /// failure leaves nothing behind. Fails only on non-UTF-8 input or a
  /// storage error.
  pub async fn ingest(&self, bytes: &[u8]) -> Result<UploadReceipt> {
    let decoded = decode(bytes, self.config.max_line_bytes)?;
    let receipt = UploadReceipt {
      id: Uuid::new_v4().to_string(),
      status: STATUS_PARSED.to_string(),
      records: decoded.records.len(),
      repaired: decoded.repaired_count(),
      corrupted: decoded.corrupted.len(),
    };

    self.store.put_batch(decoded.records, decoded.corrupted).await?;

    tracing::info!(
      upload = %receipt.id,
      bytes = bytes.len(),
      records = receipt.records,
      repaired = receipt.repaired,
      corrupted = receipt.corrupted,
      "upload ingested"
    );
    Ok(receipt)
  }

  pub async fn query(&self, filters: &QueryFilters) -> Result<Vec<Record>> {
    query::run(self.store.as_ref(), filters, self.config.default_page_size).await
  }

  pub async fn get(&self, id: &str) -> Result<Record> {
    self.store.get(id).await
  }

  pub async fn toggle_read(&self, ids: &[String]) -> Result<()> {
    self.store.toggle_read(ids).await
  }

  /// Records of one request, oldest first.
  pub async fn group(&self, correlation_id: &str) -> Result<Vec<Record>> {
    self.store.group_by_correlation(correlation_id).await
  }

  pub async fn timelines(&self) -> Result<Vec<TimelineEntry>> {
    let records = self.store.all_matching(&|_: &Record| true).await?;
    Ok(stats::timelines(&records))
  }

  pub async fn metrics(&self) -> Result<Metrics> {
    let records = self.store.all_matching(&|_: &Record| true).await?;
    Ok(stats::metrics(&records))
  }

  pub async fn corrupted(&self) -> Result<Vec<String>> {
    self.store.list_corrupted().await
  }

  /// Number of stored records.
  pub async fn len(&self) -> Result<usize> {
    self.store.len().await
  }

  /// Query result as a downloadable JSON document.
  pub async fn export(&self, filters: &QueryFilters) -> Result<Vec<u8>> {
    query::export(self.store.as_ref(), filters, self.config.default_page_size).await
  }
}
