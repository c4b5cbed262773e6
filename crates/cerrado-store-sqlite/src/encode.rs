//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings.

use cerrado_core::municipality::{Municipality, Source};
use chrono::{DateTime, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Sources ─────────────────────────────────────────────────────────────────

/// Build the joined `fontes` columns of a fact row into a [`Source`].
///
/// `id` is `NULL` when the fact has no attribution.
pub fn decode_source(id: Option<i64>, name: Option<String>, url: Option<String>) -> Option<Source> {
  id.map(|id| Source { id, name: name.unwrap_or_default(), url })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected by every `municipios` query.
pub const MUNICIPALITY_COLUMNS: &str =
  "id, slug, nome, uf, codigo_ibge, observacoes, created_at";

/// Raw values read directly from a `municipios` row.
pub struct RawMunicipality {
  pub id:            i64,
  pub slug:          String,
  pub name:          String,
  pub region:        String,
  pub registry_code: String,
  pub notes:         Option<String>,
  pub created_at:    String,
}

impl RawMunicipality {
  /// Read a row selected with [`MUNICIPALITY_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      slug:          row.get(1)?,
      name:          row.get(2)?,
      region:        row.get(3)?,
      registry_code: row.get(4)?,
      notes:         row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_municipality(self) -> Result<Municipality> {
    Ok(Municipality {
      id:            self.id,
      slug:          self.slug,
      name:          self.name,
      region:        self.region,
      registry_code: self.registry_code,
      notes:         self.notes,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
