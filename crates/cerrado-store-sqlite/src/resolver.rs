//! The entity resolver: municipalities keyed by registry code.

use cerrado_core::document::EntityKey;
use rusqlite::{Connection, OptionalExtension as _};

use crate::Result;

/// A resolved municipality row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMunicipality {
  pub id:      i64,
  pub slug:    String,
  pub created: bool,
}

/// Find the municipality with `key.registry_code`, inserting it if absent.
///
/// An existing row is returned untouched: name, region and slug keep the
/// values of the first document that introduced the registry code.
pub fn resolve_municipality(
  conn: &Connection,
  key:  &EntityKey,
  now:  &str,
) -> Result<ResolvedMunicipality> {
  let existing: Option<(i64, String)> = conn
    .query_row(
      "SELECT id, slug FROM municipios WHERE codigo_ibge = ?1",
      rusqlite::params![key.registry_code],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;

  if let Some((id, slug)) = existing {
    return Ok(ResolvedMunicipality { id, slug, created: false });
  }

  let slug = key.slug();
  conn.execute(
    "INSERT INTO municipios (slug, nome, uf, codigo_ibge, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    rusqlite::params![slug, key.name, key.region, key.registry_code, now],
  )?;

  Ok(ResolvedMunicipality { id: conn.last_insert_rowid(), slug, created: true })
}
