//! Thin JSON layer over the municipal-data store.
//!
//! Exposes an axum [`Router`] backed by any [`MunicipalityStore`], plus a
//! passthrough to the IBGE Localidades registry.

pub mod error;
pub mod handlers;
pub mod ibge;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use cerrado_core::store::MunicipalityStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use ibge::IbgeClient;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CERRADO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  /// Documents summarised on the fly while storage is empty.
  pub documents_dir:     Option<PathBuf>,
  pub ibge_base_url:     String,
  pub ibge_timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:              "127.0.0.1".to_string(),
      port:              5000,
      store_path:        PathBuf::from("cerrado.db"),
      documents_dir:     None,
      ibge_base_url:     ibge::DEFAULT_BASE_URL.to_string(),
      ibge_timeout_secs: 15,
    }
  }
}

impl ServerConfig {
  pub fn ibge_client(&self) -> reqwest::Result<IbgeClient> {
    IbgeClient::new(
      self.ibge_base_url.clone(),
      Duration::from_secs(self.ibge_timeout_secs),
    )
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: MunicipalityStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub ibge:   IbgeClient,
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router<S>(state: AppState<S>) -> Router
where
  S: MunicipalityStore + Clone + 'static,
{
  use handlers::{municipalities, registry};

  Router::new()
    .route("/api/municipios",              get(municipalities::list::<S>))
    .route("/api/municipios/{slug}",       get(municipalities::detail::<S>))
    .route("/api/municipio_ibge/{codigo}", get(registry::lookup::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
