//! freeday server: configuration and application assembly.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use freeday_core::{HolidayService, source::CalendarSource, store::CalendarStore};
use freeday_enrico::EnricoConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Top-level server configuration (deserialised from `config.toml` and the
/// `FREEDAY_*` environment).
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub upstream:   EnricoConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".into(),
      port:       8080,
      store_path: PathBuf::from("~/.local/share/freeday/freeday.db"),
      upstream:   EnricoConfig::default(),
    }
  }
}

/// Layer an optional config file under `FREEDAY_`-prefixed environment
/// variables. Nested keys use `__`, as in `FREEDAY_UPSTREAM__TIMEOUT_SECS`.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("FREEDAY")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ─────────────────────────────────────────────────────────────

/// The API router wrapped in request tracing.
pub fn app<S, U>(service: Arc<HolidayService<S, U>>) -> Router
where
  S: CalendarStore + 'static,
  U: CalendarSource + 'static,
{
  freeday_api::api_router(service).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_values_override_defaults() {
    let cfg: ServerConfig = config::Config::builder()
      .add_source(config::File::from_str(
        "port = 9000\n[upstream]\nrequests_per_second = 1\n",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.upstream.requests_per_second, 1);
    assert_eq!(cfg.upstream.timeout_secs, 30);
  }

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = load_config(Path::new("/nonexistent/freeday.toml")).unwrap();
    assert!(cfg.upstream.base_url.starts_with("https://"));
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let plain = Path::new("/var/lib/freeday.db");
    assert_eq!(expand_tilde(plain), plain);
    assert_eq!(expand_tilde(Path::new("a/~/b")), Path::new("a/~/b"));
  }
}
