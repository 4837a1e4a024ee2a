//! Event timestamp parsing.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Naive layouts accepted when the producer omits an offset (taken as UTC).
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an event timestamp into a UTC instant.
///
/// Accepts RFC3339 with any fractional precision and offset, plus the naive
/// layouts in [`NAIVE_FORMATS`]. Returns `None` for anything else.
pub fn parse_event_time(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  NAIVE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn parses_provider_layout_with_offset() {
    let t = parse_event_time("2025-09-09T15:31:32.757289+03:00").unwrap();
    let expected =
      Utc.with_ymd_and_hms(2025, 9, 9, 12, 31, 32).unwrap() + chrono::Duration::microseconds(757289);
    assert_eq!(t, expected);
  }

  #[test]
  fn parses_zulu_and_naive() {
    let z = parse_event_time("2025-01-15T10:30:00Z").unwrap();
    let naive = parse_event_time("2025-01-15T10:30:00").unwrap();
    let spaced = parse_event_time("2025-01-15 10:30:00.5").unwrap();
    assert_eq!(z, naive);
    assert!(spaced > z);
  }

  #[test]
  fn garbage_is_none() {
    assert!(parse_event_time("").is_none());
    assert!(parse_event_time("yesterday").is_none());
    assert!(parse_event_time("2025-13-45T99:00:00Z").is_none());
  }
}
