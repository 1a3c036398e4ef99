//! HTTP host for the Folio portfolio API.
//!
//! Wraps [`folio_api::api_router`] with CORS and request tracing, and loads
//! [`ServerConfig`] from a TOML file layered under `FOLIO_*` environment
//! variables.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Router,
  http::{HeaderValue, Method, header, header::InvalidHeaderValue},
};
use folio_core::store::LedgerStore;
use serde::Deserialize;
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `folio.toml`.
///
/// Every field has a default, so an absent file yields a usable config.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  /// SQLite file; a leading `~/` is expanded against `$HOME`.
  pub store_path:   PathBuf,
  /// Browser origins allowed to call the API. `"*"` allows any origin.
  pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         "127.0.0.1".to_string(),
      port:         5001,
      store_path:   PathBuf::from("portfolio.db"),
      cors_origins: ["3000", "3001", "3002", "3005"]
        .iter()
        .map(|port| format!("http://localhost:{port}"))
        .collect(),
    }
  }
}

impl ServerConfig {
  /// Load from `path` (optional) overlaid with `FOLIO_*` environment
  /// variables. `FOLIO_CORS_ORIGINS` is a comma-separated list.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("FOLIO")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins"),
      )
      .build()?
      .try_deserialize()
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
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

// ─── Router ───────────────────────────────────────────────────────────────────

/// CORS policy for the configured origins.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, InvalidHeaderValue> {
  let allow_origin = if origins.iter().any(|o| o == "*") {
    AllowOrigin::from(Any)
  } else {
    let values = origins
      .iter()
      .map(|o| HeaderValue::from_str(o))
      .collect::<Result<Vec<_>, _>>()?;
    AllowOrigin::list(values)
  };

  Ok(
    CorsLayer::new()
      .allow_origin(allow_origin)
      .allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
      ])
      .allow_headers([header::CONTENT_TYPE]),
  )
}

/// Build the full application: API routes, CORS, then request tracing.
///
/// Request spans and completions are emitted at INFO so the default filter
/// shows every request.
pub fn app<S>(store: Arc<S>, config: &ServerConfig) -> Result<Router, InvalidHeaderValue>
where
  S: LedgerStore + 'static,
{
  Ok(
    folio_api::api_router(store)
      .layer(cors_layer(&config.cors_origins)?)
      .layer(
        TraceLayer::new_for_http()
          .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
          .on_response(DefaultOnResponse::new().level(Level::INFO)),
      ),
  )
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use std::{
    io,
    sync::{Arc, Mutex},
  };

  use axum::{body::Body, http::{Request, StatusCode}};
  use config::{File, FileFormat};
  use folio_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  #[derive(Clone, Default)]
  struct LogBuffer(Arc<Mutex<Vec<u8>>>);

  impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.0.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
  }

  impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer { self.clone() }
  }

  fn from_toml(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  async fn make_app(origins: &[&str]) -> Router {
    let store  = SqliteStore::open_in_memory().await.unwrap();
    let config = ServerConfig {
      cors_origins: origins.iter().map(|o| o.to_string()).collect(),
      ..ServerConfig::default()
    };
    app(Arc::new(store), &config).unwrap()
  }

  fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
      .method(Method::OPTIONS)
      .uri("/portfolio/1")
      .header(header::ORIGIN, origin)
      .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
      .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
      .body(Body::empty())
      .unwrap()
  }

  // ── Config ──────────────────────────────────────────────────────────────────

  #[test]
  fn empty_file_yields_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.address(), "127.0.0.1:5001");
    assert_eq!(cfg.cors_origins.len(), 4);
    assert!(cfg.cors_origins.contains(&"http://localhost:3005".to_string()));
  }

  #[test]
  fn file_overrides_only_named_fields() {
    let cfg = from_toml(
      r#"
        port = 8080
        cors_origins = ["https://folio.example"]
      "#,
    );
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.store_path, PathBuf::from("portfolio.db"));
    assert_eq!(cfg.cors_origins, vec!["https://folio.example".to_string()]);
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/folio.toml")).unwrap();
    assert_eq!(cfg.store_path, ServerConfig::default().store_path);
  }

  #[test]
  fn tilde_expands_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/folio/portfolio.db")),
      PathBuf::from(home).join("folio/portfolio.db"),
    );
    assert_eq!(
      expand_tilde(Path::new("/var/lib/portfolio.db")),
      PathBuf::from("/var/lib/portfolio.db"),
    );
  }

  #[test]
  fn invalid_origin_is_rejected() {
    assert!(cors_layer(&["http://bad\norigin".to_string()]).is_err());
  }

  // ── CORS ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn preflight_from_allowed_origin() {
    let app  = make_app(&["http://localhost:3000"]).await;
    let resp = app.oneshot(preflight("http://localhost:3000")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
      "http://localhost:3000"
    );
    let methods = resp
      .headers()
      .get(header::ACCESS_CONTROL_ALLOW_METHODS)
      .unwrap()
      .to_str()
      .unwrap();
    assert!(methods.contains("PUT"), "allow-methods: {methods}");
  }

  #[tokio::test]
  async fn preflight_from_unknown_origin_gets_no_grant() {
    let app  = make_app(&["http://localhost:3000"]).await;
    let resp = app.oneshot(preflight("http://evil.example")).await.unwrap();
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
  }

  #[tokio::test]
  async fn wildcard_allows_any_origin() {
    let app  = make_app(&["*"]).await;
    let resp = app.oneshot(preflight("http://anywhere.example")).await.unwrap();
    assert_eq!(
      resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
      "*"
    );
  }

  #[tokio::test]
  async fn api_routes_are_mounted() {
    let app  = make_app(&["http://localhost:3000"]).await;
    let req  = Request::builder()
      .uri("/portfolio/years")
      .header(header::ORIGIN, "http://localhost:3000")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
      "http://localhost:3000"
    );
  }

  // ── Request logging ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn requests_are_logged_at_info() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
      .with_writer(logs.clone())
      .with_ansi(false)
      .with_max_level(Level::INFO)
      .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let app  = make_app(&["http://localhost:3000"]).await;
    let req  = Request::builder()
      .uri("/portfolio/years")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let logs = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
    let line = logs
      .lines()
      .find(|l| l.contains("finished processing request"))
      .unwrap_or_else(|| panic!("request not logged at INFO:\n{logs}"));
    assert!(line.contains("INFO"), "{line}");
    assert!(line.contains("/portfolio/years"), "{line}");
  }
}
