//! Engine configuration with sane defaults.

use std::time::Duration;

/// Tunables for ingestion, paging and storage round trips.
#[derive(Debug, Clone)]
pub struct Config {
  /// Page size used when a query gives no usable `limit`.
  pub default_page_size: usize,
  /// Lines longer than this are recorded as corrupted without repair.
  pub max_line_bytes: usize,
  /// Upper bound on each persisted-backend round trip.
  pub round_trip_timeout: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      default_page_size: 50,
      max_line_bytes: 1 << 20,
      round_trip_timeout: Duration::from_secs(5),
    }
  }
}
