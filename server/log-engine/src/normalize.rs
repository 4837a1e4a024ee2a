//! Normalize a decoded JSON object into a canonical Record.

use serde_json::{Map, Value};

use crate::error::LineError;
use crate::types::{Record, Severity};

/// String-typed keys consulted for severity, in priority order.
const SEVERITY_KEYS: [&str; 3] = ["diagnostic_severity", "severity", "@level"];

/// Integer level code consulted when no string severity is present.
const LEVEL_CODE_KEY: &str = "level";

/// Validate the known-field schema and lift first-class fields out of the bag.
///
/// The returned record has `repaired = false` and an empty `id` when the input
/// carried none; the decoder fills both in.
pub fn normalize(value: Value) -> Result<Record, LineError> {
  let mut obj = match value {
    Value::Object(obj) => obj,
    _ => return Err(LineError::schema("$", "expected a JSON object")),
  };

  let id = take_str(&mut obj, "id")?.unwrap_or_default();
  let event_timestamp = take_str(&mut obj, "@timestamp")?.filter(|s| !s.is_empty());
  let correlation_id = take_str(&mut obj, "tf_req_id")?.filter(|s| !s.is_empty());
  let read = take_bool(&mut obj, "read")?.unwrap_or(false);
  // Provenance is decided here, never by the producer.
  obj.shift_remove("repaired");

  let severity = severity_of(&obj)?;
  // "severity" is re-emitted in canonical form; the raw copy would collide.
  obj.shift_remove("severity");

  Ok(Record {
    id,
    event_timestamp,
    correlation_id,
    severity,
    read,
    repaired: false,
    fields: obj,
  })
}

fn severity_of(obj: &Map<String, Value>) -> Result<Severity, LineError> {
  let mut chosen: Option<String> = None;
  for key in SEVERITY_KEYS {
    match obj.get(key) {
      None | Some(Value::Null) => {}
      Some(Value::String(s)) => {
        if chosen.is_none() && !s.trim().is_empty() {
          chosen = Some(s.clone());
        }
      }
      Some(_) => return Err(LineError::schema(key, "expected string")),
    }
  }

  let code = match obj.get(LEVEL_CODE_KEY) {
    None | Some(Value::Null) => None,
    Some(v) => Some(
      v.as_i64()
        .ok_or_else(|| LineError::schema(LEVEL_CODE_KEY, "expected integer"))?,
    ),
  };

  Ok(match (chosen, code) {
    (Some(s), _) => Severity::from_str_loose(&s).unwrap_or_default(),
    (None, Some(code)) => Severity::from_code(code),
    (None, None) => Severity::Info,
  })
}

fn take_str(obj: &mut Map<String, Value>, key: &str) -> Result<Option<String>, LineError> {
  match obj.shift_remove(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(s)) => Ok(Some(s)),
    Some(_) => Err(LineError::schema(key, "expected string")),
  }
}

fn take_bool(obj: &mut Map<String, Value>, key: &str) -> Result<Option<bool>, LineError> {
  match obj.shift_remove(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::Bool(b)) => Ok(Some(b)),
    Some(_) => Err(LineError::schema(key, "expected boolean")),
  }
}
