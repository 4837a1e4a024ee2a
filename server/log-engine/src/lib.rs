//! Provider log engine: ingestion with line repair, storage, query and
//! aggregation over line-delimited JSON logs.
//!
//! Transports (the `log-api` HTTP server, the `log-engine` CLI) go through
//! [`LogService`]; everything below it takes and returns plain values.

pub mod config;
pub mod decode;
pub mod error;
pub mod normalize;
pub mod query;
pub mod repair;
pub mod service;
pub mod stats;
pub mod store;
pub mod time;
pub mod types;

pub use config::Config;
pub use error::{EngineError, Result};
pub use service::LogService;
pub use store::{MemoryStore, PgRecordStore, RecordStore};
pub use types::{Metrics, QueryFilters, Record, Severity, TimelineEntry, UploadReceipt};
