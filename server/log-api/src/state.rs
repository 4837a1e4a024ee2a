//! Shared handler state.

use log_engine::LogService;

pub struct AppState {
  pub service: LogService,
}

impl AppState {
  pub fn new(service: LogService) -> Self {
    Self { service }
  }
}
