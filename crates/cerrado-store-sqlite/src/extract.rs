//! Fact extractors: one per document fragment.
//!
//! Each extractor takes the resolved municipality id and its (optional)
//! fragment, resolves attributions through the source registry, and writes
//! its rows. A missing fragment writes nothing. Upserts replace the whole
//! row for the natural key, so a later document with fewer fields clears
//! the columns it leaves out.

use std::collections::BTreeMap;

use cerrado_core::{
  document::{
    AGRO_CENSUS_DEFAULT_YEAR, AgroCensusRecord, ConflictsFragment, DemographyFragment,
    GeographyFragment, GovernanceFragment, HDI_DEFAULT_YEAR, LandCoverFragment,
    MunicipalityDocument, SocioeconomicsFragment, SourceRef, Valued,
  },
  store::FactCounts,
};
use rusqlite::Connection;

use crate::{Result, sources::resolve_source_ref};

/// Run every extractor for `doc` against `conn`.
pub fn extract_all(
  conn:            &Connection,
  municipality_id: i64,
  doc:             &MunicipalityDocument,
  now:             &str,
) -> Result<FactCounts> {
  let socio = doc.socioeconomics.as_ref();
  let (land_cover, land_cover_classes) =
    land_cover(conn, municipality_id, doc.land_cover.as_ref(), now)?;

  Ok(FactCounts {
    geography: geography(conn, municipality_id, doc.geography.as_ref(), now)?,
    demography: demography(conn, municipality_id, doc.demography.as_ref(), now)?,
    socioeconomics: socioeconomics(conn, municipality_id, socio, now)?,
    agro_census: agro_census(
      conn,
      municipality_id,
      socio.and_then(|s| s.agro_census.as_ref()),
      now,
    )?,
    land_cover,
    land_cover_classes,
    governance: governance(conn, municipality_id, doc.governance.as_ref(), now)?,
    conflicts: conflicts(conn, municipality_id, doc.conflicts.as_ref(), now)?,
  })
}

/// The first attribution that names something.
fn first_source<'a>(
  candidates: impl IntoIterator<Item = Option<&'a SourceRef>>,
) -> Option<&'a SourceRef> {
  candidates.into_iter().flatten().find(|s| !s.is_empty())
}

// ─── Geography ───────────────────────────────────────────────────────────────

/// One row per `(municipality, reference year)`.
pub fn geography(
  conn:            &Connection,
  municipality_id: i64,
  fragment:        Option<&GeographyFragment>,
  now:             &str,
) -> Result<usize> {
  let Some(geo) = fragment else { return Ok(0) };
  let Some(year) = geo.reference_year() else {
    tracing::debug!(municipality_id, "geography without reference year; skipped");
    return Ok(0);
  };

  let fonte_id = resolve_source_ref(conn, geo.source(), now)?;
  let area = geo.area.as_ref().and_then(|r| r.value);
  let biome = geo.biome.as_ref().and_then(|r| r.value.as_deref());

  conn.execute(
    "INSERT INTO geografias (municipio_id, ano_referencia, area_km2, bioma, fonte_id)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (municipio_id, ano_referencia) DO UPDATE SET
       area_km2 = excluded.area_km2,
       bioma    = excluded.bioma,
       fonte_id = excluded.fonte_id",
    rusqlite::params![municipality_id, year, area, biome, fonte_id],
  )?;
  Ok(1)
}

// ─── Demography ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct DemographyRow<'a> {
  population: Option<i64>,
  density:    Option<f64>,
  source:     Option<&'a SourceRef>,
}

/// One row per census year; density joins the row of its year.
///
/// Census records that resolve to the same year merge: a later `null`
/// never clears a value an earlier record supplied.
pub fn demography(
  conn:            &Connection,
  municipality_id: i64,
  fragment:        Option<&DemographyFragment>,
  now:             &str,
) -> Result<usize> {
  let Some(demo) = fragment else { return Ok(0) };

  let mut rows: BTreeMap<i64, DemographyRow<'_>> = BTreeMap::new();
  for census in &demo.populations {
    let row = rows.entry(census.year()).or_default();
    row.population = census.record.value.or(row.population);
    row.source = first_source([row.source, Some(&census.record.source)]);
  }

  if let Some(density) = &demo.density {
    let latest_census = rows.keys().next_back().copied();
    match density.year.or(latest_census) {
      Some(year) => {
        let row = rows.entry(year).or_default();
        row.density = density.value.or(row.density);
        row.source = first_source([row.source, Some(&density.source)]);
      }
      None => tracing::debug!(municipality_id, "density without reference year; skipped"),
    }
  }

  for (year, row) in &rows {
    let fonte_id = resolve_source_ref(conn, row.source, now)?;
    conn.execute(
      "INSERT INTO demografias (municipio_id, ano, populacao, densidade_hab_km2, fonte_id)
       VALUES (?1, ?2, ?3, ?4, ?5)
       ON CONFLICT (municipio_id, ano) DO UPDATE SET
         populacao         = excluded.populacao,
         densidade_hab_km2 = excluded.densidade_hab_km2,
         fonte_id          = excluded.fonte_id",
      rusqlite::params![municipality_id, year, row.population, row.density, fonte_id],
    )?;
  }
  Ok(rows.len())
}

// ─── Socioeconomics ──────────────────────────────────────────────────────────

#[derive(Default)]
struct SocioeconomicsRow<'a> {
  hdi:            Option<f64>,
  gdp_total:      Option<f64>,
  gdp_per_capita: Option<f64>,
  source:         Option<&'a SourceRef>,
}

/// One row per year. HDI and GDP records of the same year are unified into
/// a single upsert so neither clears the other.
pub fn socioeconomics(
  conn:            &Connection,
  municipality_id: i64,
  fragment:        Option<&SocioeconomicsFragment>,
  now:             &str,
) -> Result<usize> {
  let Some(socio) = fragment else { return Ok(0) };

  let mut rows: BTreeMap<i64, SocioeconomicsRow<'_>> = BTreeMap::new();

  if let Some(hdi) = &socio.hdi {
    let row = rows.entry(hdi.year.unwrap_or(HDI_DEFAULT_YEAR)).or_default();
    row.hdi = hdi.value;
    row.source = first_source([row.source, Some(&hdi.source)]);
  }

  if let Some(record) = &socio.gdp_per_capita
    && let Some(row) = dated_row(&mut rows, record, municipality_id)
  {
    row.gdp_per_capita = record.value;
  }
  if let Some(record) = &socio.gdp_total
    && let Some(row) = dated_row(&mut rows, record, municipality_id)
  {
    row.gdp_total = record.value;
  }

  for (year, row) in &rows {
    let fonte_id = resolve_source_ref(conn, row.source, now)?;
    conn.execute(
      "INSERT INTO socioeconomias
         (municipio_id, ano, idhm, pib_total_mil_reais, pib_per_capita_reais, fonte_id)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
       ON CONFLICT (municipio_id, ano) DO UPDATE SET
         idhm                 = excluded.idhm,
         pib_total_mil_reais  = excluded.pib_total_mil_reais,
         pib_per_capita_reais = excluded.pib_per_capita_reais,
         fonte_id             = excluded.fonte_id",
      rusqlite::params![
        municipality_id,
        year,
        row.hdi,
        row.gdp_total,
        row.gdp_per_capita,
        fonte_id,
      ],
    )?;
  }
  Ok(rows.len())
}

/// The row for a record that must carry its own reference year.
fn dated_row<'r, 'a>(
  rows:            &'r mut BTreeMap<i64, SocioeconomicsRow<'a>>,
  record:          &'a Valued<f64>,
  municipality_id: i64,
) -> Option<&'r mut SocioeconomicsRow<'a>> {
  let Some(year) = record.year else {
    tracing::debug!(municipality_id, "gdp record without reference year; skipped");
    return None;
  };
  let row = rows.entry(year).or_default();
  row.source = first_source([row.source, Some(&record.source)]);
  Some(row)
}

// ─── Agricultural census ─────────────────────────────────────────────────────

pub fn agro_census(
  conn:            &Connection,
  municipality_id: i64,
  record:          Option<&AgroCensusRecord>,
  now:             &str,
) -> Result<usize> {
  let Some(census) = record else { return Ok(0) };

  let year = census.year.unwrap_or(AGRO_CENSUS_DEFAULT_YEAR);
  let fonte_id = resolve_source_ref(conn, Some(&census.source), now)?;

  conn.execute(
    "INSERT INTO agro_censo (
       municipio_id, ano, numero_estabelecimentos, area_total_estabelecimentos_ha,
       pessoal_ocupado, area_lavouras_ha, area_pastagens_ha, fonte_id
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
     ON CONFLICT (municipio_id, ano) DO UPDATE SET
       numero_estabelecimentos        = excluded.numero_estabelecimentos,
       area_total_estabelecimentos_ha = excluded.area_total_estabelecimentos_ha,
       pessoal_ocupado                = excluded.pessoal_ocupado,
       area_lavouras_ha               = excluded.area_lavouras_ha,
       area_pastagens_ha              = excluded.area_pastagens_ha,
       fonte_id                       = excluded.fonte_id",
    rusqlite::params![
      municipality_id,
      year,
      census.establishments,
      census.total_area_ha,
      census.occupied_persons,
      census.crop_area_ha,
      census.pasture_area_ha,
      fonte_id,
    ],
  )?;
  Ok(1)
}

// ─── Land cover ──────────────────────────────────────────────────────────────

/// Upsert the summary row, then replace its classes.
///
/// Returns `(summary rows, class rows)` written.
pub fn land_cover(
  conn:            &Connection,
  municipality_id: i64,
  fragment:        Option<&LandCoverFragment>,
  now:             &str,
) -> Result<(usize, usize)> {
  let Some(cover) = fragment else { return Ok((0, 0)) };
  let Some(general) = &cover.general else { return Ok((0, 0)) };
  let Some(year) = general.year else {
    tracing::debug!(municipality_id, "land cover without reference year; skipped");
    return Ok((0, 0));
  };

  let fonte_id = resolve_source_ref(conn, Some(&general.source), now)?;
  let cobertura_id: i64 = conn.query_row(
    "INSERT INTO cobertura_uso_solo_resumo (municipio_id, ano_referencia, fonte_id)
     VALUES (?1, ?2, ?3)
     ON CONFLICT (municipio_id, ano_referencia) DO UPDATE SET
       fonte_id = excluded.fonte_id
     RETURNING id",
    rusqlite::params![municipality_id, year, fonte_id],
    |row| row.get(0),
  )?;

  conn.execute(
    "DELETE FROM cobertura_uso_solo_classes WHERE cobertura_id = ?1",
    rusqlite::params![cobertura_id],
  )?;

  let mut insert = conn.prepare_cached(
    "INSERT INTO cobertura_uso_solo_classes (cobertura_id, classe, area_km2, percentual)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  let mut written = 0;
  for class in &cover.classes {
    let Some(label) = class.label.as_deref() else {
      tracing::debug!(municipality_id, "land cover class without label; skipped");
      continue;
    };
    insert.execute(rusqlite::params![cobertura_id, label, class.area_km2, class.percentage])?;
    written += 1;
  }
  Ok((1, written))
}

// ─── Governance ──────────────────────────────────────────────────────────────

/// At most one row per municipality.
pub fn governance(
  conn:            &Connection,
  municipality_id: i64,
  fragment:        Option<&GovernanceFragment>,
  now:             &str,
) -> Result<usize> {
  let Some(plan) = fragment.and_then(|g| g.master_plan.as_ref()) else {
    return Ok(0);
  };

  let fonte_id = resolve_source_ref(conn, Some(&plan.source), now)?;
  conn.execute(
    "INSERT INTO governancas
       (municipio_id, possui_plano_diretor, lei_referencia, observacao, fonte_id)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (municipio_id) DO UPDATE SET
       possui_plano_diretor = excluded.possui_plano_diretor,
       lei_referencia       = excluded.lei_referencia,
       observacao           = excluded.observacao,
       fonte_id             = excluded.fonte_id",
    rusqlite::params![
      municipality_id,
      plan.exists,
      plan.legal_reference,
      plan.notes,
      fonte_id,
    ],
  )?;
  Ok(1)
}

// ─── Conflicts ───────────────────────────────────────────────────────────────

/// Plain inserts: re-ingesting a document appends its conflicts again.
pub fn conflicts(
  conn:            &Connection,
  municipality_id: i64,
  fragment:        Option<&ConflictsFragment>,
  now:             &str,
) -> Result<usize> {
  let Some(fragment) = fragment else { return Ok(0) };

  for (kind, record) in &fragment.entries {
    let fonte_id = resolve_source_ref(conn, Some(&record.source), now)?;
    conn.execute(
      "INSERT INTO conflitos (municipio_id, tipo, descricao, fonte_id) VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![municipality_id, kind, record.description, fonte_id],
    )?;
  }
  Ok(fragment.entries.len())
}
