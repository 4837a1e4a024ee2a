//! Decoder/repair pipeline: raw bytes in, records + corrupted lines out.

use serde_json::Value;
use uuid::Uuid;

use crate::error::{EngineError, LineError, RepairFailure};
use crate::normalize::normalize;
use crate::repair::repair;
use crate::types::Record;

/// Output of one decode pass.
#[derive(Debug, Default)]
pub struct Decoded {
  pub records: Vec<Record>,
  /// Raw lines that failed direct parse, in input order. Lines that were
  /// recovered by repair are listed here too.
  pub corrupted: Vec<String>,
}

impl Decoded {
  pub fn repaired_count(&self) -> usize {
    self.records.iter().filter(|r| r.repaired).count()
  }
}

/// Decode a line-delimited JSON upload.
///
/// Fails only when the bytes are not UTF-8. Every per-line failure is absorbed:
/// the line is recorded as corrupted and, when repair succeeds, still yields a
/// record flagged `repaired`.
pub fn decode(bytes: &[u8], max_line_bytes: usize) -> Result<Decoded, EngineError> {
  let text =
    std::str::from_utf8(bytes).map_err(|e| EngineError::decode(format!("input is not UTF-8: {e}")))?;
  let text = text.strip_prefix('\u{feff}').unwrap_or(text);

  // A trailing newline terminates the last line; it does not start another.
  let text = text.strip_suffix('\n').unwrap_or(text);
  if text.is_empty() {
    return Ok(Decoded::default());
  }

  let mut out = Decoded::default();
  for (idx, raw) in text.split('\n').enumerate() {
    let line = raw.strip_suffix('\r').unwrap_or(raw);
    let line_no = idx + 1;

    let err = match parse_line(line, max_line_bytes) {
      Ok(record) => {
        out.records.push(with_identity(record));
        continue;
      }
      Err(e) => e,
    };

    tracing::debug!(line = line_no, error = %err, "direct parse failed");
    out.corrupted.push(line.to_string());
    if matches!(err, LineError::TooLong { .. }) {
      continue;
    }

    match repair_line(line) {
      Ok(mut record) => {
        record.repaired = true;
        out.records.push(with_identity(record));
      }
      Err(e) => {
        tracing::debug!(line = line_no, error = %e, "repair failed");
      }
    }
  }

  Ok(out)
}

fn parse_line(line: &str, max_line_bytes: usize) -> Result<Record, LineError> {
  if line.len() > max_line_bytes {
    return Err(LineError::TooLong {
      limit: max_line_bytes,
    });
  }
  let value: Value = serde_json::from_str(line)?;
  normalize(value)
}

fn repair_line(line: &str) -> Result<Record, RepairFailure> {
  let fixed = repair(line)?;
  let value: Value = serde_json::from_str(&fixed).map_err(|_| RepairFailure::StillInvalid)?;
  normalize(value).map_err(|_| RepairFailure::StillInvalid)
}

fn with_identity(mut record: Record) -> Record {
  if record.id.is_empty() {
    record.id = Uuid::new_v4().to_string();
  }
  record
}
