//! Query engine: filter, order newest-first, paginate.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::store::RecordStore;
use crate::time::parse_event_time;
use crate::types::{QueryFilters, Record, Severity};

/// Filters resolved into comparable values. Unusable inputs become `None`.
#[derive(Debug, Default)]
pub struct CompiledFilters {
  resource_type: Option<String>,
  from: Option<DateTime<Utc>>,
  to: Option<DateTime<Utc>>,
  level: Option<Severity>,
  search: Option<String>,
}

impl CompiledFilters {
  pub fn compile(filters: &QueryFilters) -> Self {
    Self {
      resource_type: non_empty(&filters.tf_resource_type).map(str::to_string),
      from: time_bound("timestamp_from", &filters.timestamp_from),
      to: time_bound("timestamp_to", &filters.timestamp_to),
      level: non_empty(&filters.level).and_then(|l| {
        let parsed = Severity::from_str_loose(l);
        if parsed.is_none() {
          tracing::debug!(level = l, "ignoring unrecognized level filter");
        }
        parsed
      }),
      search: non_empty(&filters.search).map(str::to_lowercase),
    }
  }

  /// Conjunction of every active constraint.
  pub fn matches(&self, record: &Record) -> bool {
    if let Some(rt) = &self.resource_type {
      if record.resource_type() != Some(rt.as_str()) {
        return false;
      }
    }
    if let Some(level) = self.level {
      if record.severity != level {
        return false;
      }
    }
    if self.from.is_some() || self.to.is_some() {
      // Records without a usable timestamp cannot satisfy a range.
      let Some(t) = record.event_time() else {
        return false;
      };
      if self.from.is_some_and(|from| t < from) || self.to.is_some_and(|to| t > to) {
        return false;
      }
    }
    if let Some(needle) = &self.search {
      let haystack = serde_json::to_string(record).unwrap_or_default();
      if !haystack.to_lowercase().contains(needle.as_str()) {
        return false;
      }
    }
    true
  }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
  v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn time_bound(name: &str, v: &Option<String>) -> Option<DateTime<Utc>> {
  let raw = non_empty(v)?;
  let parsed = parse_event_time(raw);
  if parsed.is_none() {
    tracing::debug!(filter = name, value = raw, "ignoring unparseable time bound");
  }
  parsed
}

/// Order newest first; ties break on id ascending.
///
/// Records whose timestamp is missing or unparseable go last. Unparseable
/// ones are reported but never fail the sort.
pub fn sort_newest_first(records: &mut Vec<Record>) {
  let mut keyed: Vec<(Option<DateTime<Utc>>, Record)> = records
    .drain(..)
    .map(|r| {
      let t = r.event_time();
      if t.is_none() {
        if let Some(raw) = r.event_timestamp.as_deref() {
          tracing::warn!(id = %r.id, timestamp = raw, "unparseable event timestamp; sorting last");
        }
      }
      (t, r)
    })
    .collect();

  keyed.sort_by(|(ta, a), (tb, b)| tb.cmp(ta).then_with(|| a.id.cmp(&b.id)));
  records.extend(keyed.into_iter().map(|(_, r)| r));
}

/// Slice one page out of an ordered result.
///
/// `page` is 1-based (<= 0 means 1); `limit` <= 0 means `default_limit`.
/// A page past the end is empty, not an error.
pub fn paginate(records: Vec<Record>, page: i64, limit: i64, default_limit: usize) -> Vec<Record> {
  let page = usize::try_from(page).ok().filter(|&p| p > 0).unwrap_or(1);
  let limit = usize::try_from(limit)
    .ok()
    .filter(|&l| l > 0)
    .unwrap_or(default_limit.max(1));
  let start = (page - 1).saturating_mul(limit);
  if start >= records.len() {
    return Vec::new();
  }
  records.into_iter().skip(start).take(limit).collect()
}

/// Run a query against any store.
pub async fn run(
  store: &dyn RecordStore,
  filters: &QueryFilters,
  default_limit: usize,
) -> Result<Vec<Record>> {
  let compiled = CompiledFilters::compile(filters);
  let mut hits = store.all_matching(&|r: &Record| compiled.matches(r)).await?;
  sort_newest_first(&mut hits);
  Ok(paginate(hits, filters.page, filters.limit, default_limit))
}

/// Same result as [`run`], rendered as a pretty-printed JSON array.
pub async fn export(
  store: &dyn RecordStore,
  filters: &QueryFilters,
  default_limit: usize,
) -> Result<Vec<u8>> {
  let records = run(store, filters, default_limit).await?;
  Ok(serde_json::to_vec_pretty(&records)?)
}
