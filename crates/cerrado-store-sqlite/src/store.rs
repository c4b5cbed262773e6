//! [`SqliteStore`]: the SQLite implementation of [`MunicipalityStore`].

use std::path::Path;

use cerrado_core::{
  document::MunicipalityDocument,
  municipality::{Municipality, MunicipalitySummary, MunicipalityView},
  store::{IngestedDocument, MunicipalityStore},
};
use chrono::Utc;
use rusqlite::Connection;

use crate::{
  Error, Result,
  encode::{RawMunicipality, encode_dt},
  extract::extract_all,
  read,
  resolver::resolve_municipality,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A municipal-data store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All writes
/// go through that one connection, so ingestion is single-writer.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a read-only closure against the connection; used by tests to
  /// inspect raw tables.
  pub async fn with_connection<F, R>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&Connection) -> rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    Ok(self.conn.call(move |conn| Ok(f(conn)?)).await?)
  }
}

/// Resolve the municipality and run every extractor inside one transaction.
///
/// The transaction is rolled back when dropped, so any early return through
/// `?` leaves the database exactly as it was before this document.
fn ingest_in_transaction(
  conn: &mut Connection,
  doc:  &MunicipalityDocument,
) -> Result<IngestedDocument> {
  let now = encode_dt(Utc::now());
  let tx = conn.transaction()?;

  let key = doc
    .identification
    .as_ref()
    .ok_or(cerrado_core::Error::MalformedEntity("missing identification"))?
    .entity_key()?;
  let municipality = resolve_municipality(&tx, &key, &now)?;
  let facts = extract_all(&tx, municipality.id, doc, &now)?;

  tx.commit()?;

  Ok(IngestedDocument {
    municipality_id: municipality.id,
    registry_code:   key.registry_code,
    slug:            municipality.slug,
    created:         municipality.created,
    facts,
  })
}

// ─── MunicipalityStore impl ──────────────────────────────────────────────────

impl MunicipalityStore for SqliteStore {
  type Error = Error;

  async fn ingest_document(&self, document: MunicipalityDocument) -> Result<IngestedDocument> {
    self
      .conn
      .call(move |conn| Ok(ingest_in_transaction(conn, &document)))
      .await?
  }

  async fn list_municipalities(&self) -> Result<Vec<Municipality>> {
    let raws: Vec<RawMunicipality> = self
      .conn
      .call(|conn| Ok(read::list_municipalities(conn)?))
      .await?;

    raws.into_iter().map(RawMunicipality::into_municipality).collect()
  }

  async fn list_summaries(&self) -> Result<Vec<MunicipalitySummary>> {
    Ok(
      self
        .conn
        .call(|conn| Ok(read::list_summaries(conn)?))
        .await?,
    )
  }

  async fn get_by_slug(&self, slug: &str) -> Result<Option<MunicipalityView>> {
    let slug = slug.to_owned();
    self
      .conn
      .call(move |conn| Ok(read::load_view(conn, &slug)))
      .await?
  }

  async fn delete_municipality(&self, registry_code: &str) -> Result<bool> {
    let code = registry_code.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM municipios WHERE codigo_ibge = ?1",
          rusqlite::params![code],
        )?)
      })
      .await?;

    if deleted > 0 {
      tracing::info!(registry_code, "municipality deleted");
    }
    Ok(deleted > 0)
  }
}
