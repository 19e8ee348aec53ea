//! hrdesk HTTP server: configuration and router assembly.
//!
//! The binary in `main.rs` reads a [`ServerConfig`], opens the SQLite store
//! and serves [`router`].

use std::{path::Path, sync::Arc};

use axum::{Router, routing::get};
use hrdesk_api::{ApiSettings, api_router};
use hrdesk_core::{payroll::PayrollRules, store::DocumentStore};
use hrdesk_payslip::Company;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Environment variables with this prefix override file settings, e.g.
/// `HRDESK_PORT=9000` or `HRDESK_COMPANY__NAME=Acme`.
pub const ENV_PREFIX: &str = "HRDESK";

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> String { "~/.local/share/hrdesk/hrdesk.db".to_owned() }

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// May start with `~/`.
  #[serde(default = "default_store_path")]
  pub store_path: String,
  #[serde(default)]
  pub company:    Company,
  #[serde(default)]
  pub payroll:    PayrollRules,
}

impl ServerConfig {
  /// Layer `path` (optional) under `HRDESK_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings { rules: self.payroll.clone(), company: self.company.clone() }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: `/health` plus the JSON API under `/api`.
pub fn router<S>(store: Arc<S>, settings: ApiSettings) -> Router
where
  S: DocumentStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(store, settings))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }
