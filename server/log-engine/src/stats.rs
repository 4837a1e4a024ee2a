//! Aggregates over stored records: per-request timelines and severity metrics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{Metrics, Record, Severity, TimelineEntry};

/// Ordering key for an event timestamp: parsed instants compare by time and
/// sit above unparseable ones; unparseable ones compare by raw text.
type TimeKey = (Option<DateTime<Utc>>, String);

struct Span {
  start: TimeKey,
  end: TimeKey,
  status: Severity,
  count: u64,
}

/// Group records by correlation id into timeline entries.
///
/// Records without a correlation id or event timestamp are skipped. Status is
/// the most severe level in the group. Entries are ordered by start, then id.
pub fn timelines(records: &[Record]) -> Vec<TimelineEntry> {
  let mut spans: HashMap<&str, Span> = HashMap::new();

  for record in records {
    let (Some(cid), Some(ts)) = (
      record.correlation_id.as_deref(),
      record.event_timestamp.as_deref(),
    ) else {
      continue;
    };
    let key: TimeKey = (record.event_time(), ts.to_string());

    spans
      .entry(cid)
      .and_modify(|span| {
        if key < span.start {
          span.start = key.clone();
        }
        if key > span.end {
          span.end = key.clone();
        }
        span.status = span.status.max(record.severity);
        span.count += 1;
      })
      .or_insert_with(|| Span {
        start: key.clone(),
        end: key.clone(),
        status: record.severity,
        count: 1,
      });
  }

  let mut ordered: Vec<(&str, Span)> = spans.into_iter().collect();
  ordered.sort_by(|(a_id, a), (b_id, b)| a.start.cmp(&b.start).then_with(|| a_id.cmp(b_id)));

  ordered
    .into_iter()
    .map(|(cid, span)| TimelineEntry {
      tf_req_id: cid.to_string(),
      start: span.start.1,
      end: span.end.1,
      status: span.status,
      count: span.count,
    })
    .collect()
}

/// Severity histogram over all records in one pass.
pub fn metrics(records: &[Record]) -> Metrics {
  let mut metrics = Metrics::default();
  for record in records {
    *metrics.levels.entry(record.severity).or_insert(0) += 1;
    match record.severity {
      Severity::Error => metrics.errors += 1,
      Severity::Warning => metrics.warnings += 1,
      _ => {}
    }
  }
  metrics
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Map;

  fn rec(id: &str, cid: Option<&str>, ts: Option<&str>, severity: Severity) -> Record {
    Record {
      id: id.into(),
      event_timestamp: ts.map(Into::into),
      correlation_id: cid.map(Into::into),
      severity,
      read: false,
      repaired: false,
      fields: Map::new(),
    }
  }

  #[test]
  fn status_escalates_to_error() {
    let records = vec![
      rec("1", Some("r1"), Some("2025-01-15T10:00:00Z"), Severity::Info),
      rec("2", Some("r1"), Some("2025-01-15T10:01:00Z"), Severity::Error),
      rec("3", Some("r1"), Some("2025-01-15T10:02:00Z"), Severity::Warning),
    ];
    let entries = timelines(&records);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, Severity::Error);
    assert_eq!(entries[0].count, 3);
  }

  #[test]
  fn status_warning_without_error() {
    let records = vec![
      rec("1", Some("r1"), Some("2025-01-15T10:00:00Z"), Severity::Warning),
      rec("2", Some("r1"), Some("2025-01-15T10:01:00Z"), Severity::Info),
    ];
    assert_eq!(timelines(&records)[0].status, Severity::Warning);
  }

  #[test]
  fn start_and_end_compare_as_time() {
    let records = vec![
      rec("1", Some("r1"), Some("2025-01-15T10:00:00Z"), Severity::Info),
      // 09:00 UTC, lexically the largest string here.
      rec("2", Some("r1"), Some("2025-01-15T12:00:00+03:00"), Severity::Info),
      rec("3", Some("r1"), Some("2025-01-15T10:30:00Z"), Severity::Info),
    ];
    let entry = &timelines(&records)[0];
    assert_eq!(entry.start, "2025-01-15T12:00:00+03:00");
    assert_eq!(entry.end, "2025-01-15T10:30:00Z");
  }

  #[test]
  fn skips_records_without_group_or_time() {
    let records = vec![
      rec("1", None, Some("2025-01-15T10:00:00Z"), Severity::Error),
      rec("2", Some("r1"), None, Severity::Error),
    ];
    assert!(timelines(&records).is_empty());
  }

  #[test]
  fn entries_ordered_by_start() {
    let records = vec![
      rec("1", Some("late"), Some("2025-01-15T11:00:00Z"), Severity::Info),
      rec("2", Some("early"), Some("2025-01-15T10:00:00Z"), Severity::Info),
    ];
    let ids: Vec<String> = timelines(&records).into_iter().map(|e| e.tf_req_id).collect();
    assert_eq!(ids, vec!["early", "late"]);
  }

  #[test]
  fn histogram_sums_to_record_count() {
    let records = vec![
      rec("1", None, None, Severity::Error),
      rec("2", None, None, Severity::Error),
      rec("3", None, None, Severity::Warning),
      rec("4", None, None, Severity::Info),
      rec("5", None, None, Severity::Debug),
    ];
    let m = metrics(&records);
    assert_eq!(m.errors, 2);
    assert_eq!(m.warnings, 1);
    assert_eq!(m.levels[&Severity::Error], m.errors);
    assert_eq!(m.levels[&Severity::Warning], m.warnings);
    assert_eq!(m.total(), records.len() as u64);
  }

  #[test]
  fn empty_store_metrics() {
    let m = metrics(&[]);
    assert_eq!(m.total(), 0);
    assert_eq!(m.errors, 0);
  }
}
