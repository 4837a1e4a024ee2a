//! Binary entrypoint: read a whole upload from stdin, print one JSON report.
//!
//! The report is `{receipt, stored, metrics, timelines}` for the uploaded
//! lines; `stored` counts distinct records after upserts.
//! Diagnostics go to stderr, filtered by `RUST_LOG`.

use std::io::{self, Read, Write};

use log_engine::{LogService, Metrics, TimelineEntry, UploadReceipt};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Serialize)]
struct Report {
  receipt: UploadReceipt,
  stored: usize,
  metrics: Metrics,
  timelines: Vec<TimelineEntry>,
}

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("log_engine=info")))
    .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
    .init();

  if let Err(e) = run().await {
    let _ = writeln!(io::stderr(), "log-engine: {}", e);
    std::process::exit(1);
  }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
  let mut input = Vec::new();
  io::stdin().lock().read_to_end(&mut input)?;

  let service = LogService::with_defaults();
  let receipt = service.ingest(&input).await?;
  let report = Report {
    receipt,
    stored: service.len().await?,
    metrics: service.metrics().await?,
    timelines: service.timelines().await?,
  };

  let mut out = io::BufWriter::new(io::stdout().lock());
  serde_json::to_writer_pretty(&mut out, &report)?;
  writeln!(out)?;
  out.flush()?;
  Ok(())
}
