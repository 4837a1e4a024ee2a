//! Provider Log API
//!
//! HTTP service over [`log_engine::LogService`]. Binds to 127.0.0.1 by default.

pub mod config;
pub mod error;
mod handlers;
pub mod routes;
mod state;
mod types;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{app, router};
pub use state::AppState;
