//! In-memory record store.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{EngineError, Result};
use crate::store::{RecordPredicate, RecordStore};
use crate::types::Record;

#[derive(Debug, Default)]
struct Inner {
  records: HashMap<String, Record>,
  /// Correlation id -> identities of its records.
  by_correlation: HashMap<String, BTreeSet<String>>,
  corrupted: Vec<String>,
}

impl Inner {
  fn unindex(&mut self, record: &Record) {
    let Some(cid) = record.correlation_id.as_deref() else {
      return;
    };
    if let Some(ids) = self.by_correlation.get_mut(cid) {
      ids.remove(&record.id);
      if ids.is_empty() {
        self.by_correlation.remove(cid);
      }
    }
  }

  fn index(&mut self, record: &Record) {
    if let Some(cid) = record.correlation_id.as_deref() {
      self
        .by_correlation
        .entry(cid.to_string())
        .or_default()
        .insert(record.id.clone());
    }
  }
}

/// Thread-safe in-memory store.
///
/// One reader/writer lock guards all state. Scans and lookups share it;
/// `put_batch` and `toggle_read` hold it exclusively, so no reader ever
/// observes half of an upload. The lock is never held across an
/// await point.
#[derive(Debug, Default)]
pub struct MemoryStore {
  inner: RwLock<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl RecordStore for MemoryStore {
  async fn put_batch(&self, records: Vec<Record>, corrupted: Vec<String>) -> Result<()> {
    let mut inner = self.inner.write();
    for record in records {
      if let Some(prev) = inner.records.remove(&record.id) {
        inner.unindex(&prev);
      }
      inner.index(&record);
      inner.records.insert(record.id.clone(), record);
    }
    inner.corrupted.extend(corrupted);
    Ok(())
  }

  async fn get(&self, id: &str) -> Result<Record> {
    self
      .inner
      .read()
      .records
      .get(id)
      .cloned()
      .ok_or_else(|| EngineError::not_found(id))
  }

  async fn toggle_read(&self, ids: &[String]) -> Result<()> {
    let distinct: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
    let mut inner = self.inner.write();
    for id in distinct {
      if let Some(record) = inner.records.get_mut(id) {
        record.read = !record.read;
      }
    }
    Ok(())
  }

  async fn all_matching(&self, predicate: RecordPredicate<'_>) -> Result<Vec<Record>> {
    let inner = self.inner.read();
    Ok(inner.records.values().filter(|r| predicate(r)).cloned().collect())
  }

  async fn group_by_correlation(&self, correlation_id: &str) -> Result<Vec<Record>> {
    let mut group: Vec<Record> = {
      let inner = self.inner.read();
      match inner.by_correlation.get(correlation_id) {
        Some(ids) => ids.iter().filter_map(|id| inner.records.get(id)).cloned().collect(),
        None => Vec::new(),
      }
    };
    group.sort_by_cached_key(|r| (r.event_time(), r.id.clone()));
    Ok(group)
  }

  async fn list_corrupted(&self) -> Result<Vec<String>> {
    Ok(self.inner.read().corrupted.clone())
  }

  async fn len(&self) -> Result<usize> {
    Ok(self.inner.read().records.len())
  }
}
