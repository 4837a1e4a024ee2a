//! Record storage backends.
//!
//! [`RecordStore`] is the only contract the query engine and aggregator see.
//! Two implementations are provided and chosen at startup:
//! - [`MemoryStore`]: a single reader/writer lock over in-process maps
//! - [`PgRecordStore`]: one wide PostgreSQL table, one transaction per upload

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Record;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgRecordStore;

/// Predicate applied during a full scan.
pub type RecordPredicate<'a> = &'a (dyn Fn(&Record) -> bool + Send + Sync);

/// Storage contract for ingested records and corrupted lines.
#[async_trait]
pub trait RecordStore: Send + Sync {
  /// Upserts every record by identity (last write wins) and appends the
  /// raw corrupted lines of the same upload.
  ///
  /// Both halves are applied atomically: readers see all of it or none of it.
  ///
  /// # Errors
  ///
  /// Returns a storage error if the backend rejects any record or line;
  /// nothing from the batch is kept in that case.
  async fn put_batch(&self, records: Vec<Record>, corrupted: Vec<String>) -> Result<()>;

  /// Gets a record by identity.
  ///
  /// # Errors
  ///
  /// Returns `NotFound` if no record has this identity.
  async fn get(&self, id: &str) -> Result<Record>;

  /// Flips the read flag of each distinct id present. Unknown ids are ignored.
  async fn toggle_read(&self, ids: &[String]) -> Result<()>;

  /// Full scan returning the records accepted by `predicate`, in no
  /// particular order.
  async fn all_matching(&self, predicate: RecordPredicate<'_>) -> Result<Vec<Record>>;

  /// Records sharing `correlation_id`, oldest first. Records with a missing
  /// or unparseable timestamp come first; ties break on id.
  async fn group_by_correlation(&self, correlation_id: &str) -> Result<Vec<Record>>;

  /// Corrupted lines in arrival order.
  async fn list_corrupted(&self) -> Result<Vec<String>>;

  /// Number of stored records.
  async fn len(&self) -> Result<usize>;
}
