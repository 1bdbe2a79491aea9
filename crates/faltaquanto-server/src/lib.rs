//! Server assembly for FaltaQuanto.
//!
//! Loads [`ServerConfig`], and mounts the JSON API under `/api` with request
//! tracing.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use chrono::Duration;
use faltaquanto_api::{ApiSettings, api_router};
use faltaquanto_core::{store::AttendanceStore, subject::DEFAULT_ABSENCE_LIMIT};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix of environment variables overriding config keys, e.g.
/// `FALTAQUANTO_PORT=8080`.
pub const ENV_PREFIX: &str = "FALTAQUANTO";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  pub session_ttl_hours:     u32,
  pub default_absence_limit: u32,
}

impl ServerConfig {
  /// Defaults, then `path` (if it exists), then `FALTAQUANTO_*` variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 5240)?
      .set_default("store_path", "faltaquanto.db")?
      .set_default("session_ttl_hours", 720)?
      .set_default("default_absence_limit", i64::from(DEFAULT_ABSENCE_LIMIT))?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      session_ttl:           Duration::hours(i64::from(self.session_ttl_hours)),
      default_absence_limit: self.default_absence_limit,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The complete application: the API under `/api`, traced.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: AttendanceStore + 'static,
{
  Router::new()
    .nest("/api", api_router(store, config.api_settings()))
    .layer(TraceLayer::new_for_http())
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

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use faltaquanto_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{name}-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
  }

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/faltaquanto.toml")).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 5240);
    assert_eq!(cfg.store_path, PathBuf::from("faltaquanto.db"));
    assert_eq!(cfg.session_ttl_hours, 720);
    assert_eq!(cfg.default_absence_limit, 7);
    assert_eq!(cfg.address(), "127.0.0.1:5240");
  }

  #[test]
  fn file_overrides_defaults() {
    let path = scratch_file(
      "faltaquanto-config",
      "port = 8080\nstore_path = \"/var/lib/faltaquanto.db\"\ndefault_absence_limit = 12\n",
    );
    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/faltaquanto.db"));
    assert_eq!(cfg.default_absence_limit, 12);
    assert_eq!(cfg.host, "127.0.0.1");

    let settings = cfg.api_settings();
    assert_eq!(settings.session_ttl, Duration::hours(720));
    assert_eq!(settings.default_absence_limit, 12);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/faltaquanto.db")),
      PathBuf::from(home).join("faltaquanto.db")
    );
    assert_eq!(expand_tilde(Path::new("/tmp/x.db")), PathBuf::from("/tmp/x.db"));
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let cfg = ServerConfig::load(Path::new("/nonexistent/faltaquanto.toml")).unwrap();
    let app = router(store, &cfg);

    let resp = app
      .clone()
      .oneshot(Request::get("/api/subjects").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "auth/invalid-session");

    let resp = app
      .oneshot(Request::get("/subjects").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
