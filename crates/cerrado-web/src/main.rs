//! cerrado server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the JSON API over HTTP.
//!
//! # Loading documents
//!
//! To ingest a directory of municipality documents and exit:
//!
//! ```sh
//! cargo run -p cerrado-web --bin cerrado -- --ingest planejamento/
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use cerrado_core::ingest::{FileStatus, ingest_directory};
use cerrado_store_sqlite::SqliteStore;
use cerrado_web::{AppState, ServerConfig};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cerrado municipal data server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Ingest every `.json` document in DIR, print one line per file and exit.
  #[arg(long, value_name = "DIR")]
  ingest: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CERRADO"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.documents_dir = server_cfg.documents_dir.as_deref().map(expand_tilde);

  if let Some(parent) = server_cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  // Helper mode: load a directory and exit.
  if let Some(dir) = cli.ingest {
    let dir = expand_tilde(&dir);
    let report = ingest_directory(&store, &dir)
      .await
      .with_context(|| format!("failed to ingest {dir:?}"))?;
    for outcome in &report.outcomes {
      println!("{}\t{}\t{}", outcome.status, outcome.filename, outcome.detail);
    }
    println!(
      "{} ok, {} skipped, {} errors",
      report.count(FileStatus::Ok),
      report.count(FileStatus::Skipped),
      report.count(FileStatus::Error),
    );
    return Ok(());
  }

  let state = AppState {
    store:  Arc::new(store),
    ibge:   server_cfg
      .ibge_client()
      .context("failed to build IBGE client")?,
    config: Arc::new(server_cfg.clone()),
  };

  let app = cerrado_web::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
