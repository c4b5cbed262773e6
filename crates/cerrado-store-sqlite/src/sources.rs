//! The source registry: attribution records deduplicated by lookup-or-insert.

use cerrado_core::document::SourceRef;
use rusqlite::{Connection, OptionalExtension as _};

use crate::Result;

/// Resolve an attribution to a `fontes` row id, creating it if needed.
///
/// Returns `None` when neither name nor URL is given. Otherwise the
/// supplied fields act as filters: a row matches when it agrees on every
/// field that was given. A new row defaults a missing name to `""`.
/// Existing rows are never modified.
///
/// The lookup and the insert are separate statements, so two concurrent
/// writers could both insert; ingestion is single-writer per run.
pub fn resolve_source(
  conn: &Connection,
  name: Option<&str>,
  url:  Option<&str>,
  now:  &str,
) -> Result<Option<i64>> {
  if name.is_none() && url.is_none() {
    return Ok(None);
  }

  let existing: Option<i64> = conn
    .query_row(
      "SELECT id FROM fontes
       WHERE (?1 IS NULL OR nome = ?1)
         AND (?2 IS NULL OR url = ?2)
       ORDER BY id
       LIMIT 1",
      rusqlite::params![name, url],
      |row| row.get(0),
    )
    .optional()?;

  if let Some(id) = existing {
    return Ok(Some(id));
  }

  conn.execute(
    "INSERT INTO fontes (nome, url, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
    rusqlite::params![name.unwrap_or_default(), url, now],
  )?;
  Ok(Some(conn.last_insert_rowid()))
}

/// [`resolve_source`] for a document's `fonte_nome` / `fonte_url` pair.
pub fn resolve_source_ref(
  conn:   &Connection,
  source: Option<&SourceRef>,
  now:    &str,
) -> Result<Option<i64>> {
  match source {
    Some(s) => resolve_source(conn, s.name.as_deref(), s.url.as_deref(), now),
    None => Ok(None),
  }
}
