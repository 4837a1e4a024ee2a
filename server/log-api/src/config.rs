//! Server configuration from environment variables.

use std::time::Duration;

use log_engine::Config;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

#[derive(Debug, thiserror::Error)]
#[error("{name} must be a valid {expected}, got {value:?}")]
pub struct ConfigError {
  name: &'static str,
  expected: &'static str,
  value: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
  /// `None` selects the in-memory store.
  pub database_url: Option<String>,
  pub cors_origins: Vec<String>,
  pub max_upload_bytes: usize,
  pub engine: Config,
}

impl ServerConfig {
  /// Load configuration from environment variables with defaults.
  ///
  /// | Env Var             | Default                                        |
  /// |---------------------|------------------------------------------------|
  /// | `HOST`              | `127.0.0.1`                                    |
  /// | `PORT`              | `5005`                                         |
  /// | `DATABASE_URL`      | unset (in-memory store)                        |
  /// | `CORS_ORIGINS`      | `http://localhost:5173,http://127.0.0.1:5173`  |
  /// | `MAX_UPLOAD_BYTES`  | `10485760`                                     |
  /// | `DEFAULT_PAGE_SIZE` | `50`                                           |
  /// | `DB_TIMEOUT_SECS`   | `5`                                            |
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let defaults = Config::default();

    let host = var("HOST").unwrap_or_else(|| "127.0.0.1".into());
    let port: u16 = parsed(var("PORT"), "PORT", "u16")?.unwrap_or(5005);
    let database_url = var("DATABASE_URL");
    let cors_origins = var("CORS_ORIGINS")
      .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
      .split(',')
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect();
    let max_upload_bytes: usize =
      parsed(var("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES", "usize")?.unwrap_or(10 * 1024 * 1024);
    let default_page_size: usize = parsed(var("DEFAULT_PAGE_SIZE"), "DEFAULT_PAGE_SIZE", "usize")?
      .unwrap_or(defaults.default_page_size);
    let round_trip_timeout = parsed::<u64>(var("DB_TIMEOUT_SECS"), "DB_TIMEOUT_SECS", "u64")?
      .map(Duration::from_secs)
      .unwrap_or(defaults.round_trip_timeout);

    Ok(Self {
      host,
      port,
      database_url,
      cors_origins,
      max_upload_bytes,
      engine: Config {
        default_page_size,
        round_trip_timeout,
        ..defaults
      },
    })
  }

  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

fn parsed<T: std::str::FromStr>(
  value: Option<String>,
  name: &'static str,
  expected: &'static str,
) -> Result<Option<T>, ConfigError> {
  value
    .map(|v| {
      v.parse().map_err(|_| ConfigError {
        name,
        expected,
        value: v,
      })
    })
    .transpose()
}
