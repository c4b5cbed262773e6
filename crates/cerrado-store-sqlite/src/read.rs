//! The read path: municipality lists, summaries and full views.

use cerrado_core::municipality::{
  AgroCensusFact, ConflictFact, DemographyFact, GeographyFact, GovernanceFact,
  LandCoverClassFact, LandCoverFact, MunicipalitySummary, MunicipalityView,
  SocioeconomicsFact,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{MUNICIPALITY_COLUMNS, RawMunicipality, decode_source},
};

pub fn list_municipalities(conn: &Connection) -> rusqlite::Result<Vec<RawMunicipality>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {MUNICIPALITY_COLUMNS} FROM municipios ORDER BY nome, id"
  ))?;
  let rows = stmt
    .query_map([], RawMunicipality::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Headline indicators; each one comes from the latest year that has it.
pub fn list_summaries(conn: &Connection) -> rusqlite::Result<Vec<MunicipalitySummary>> {
  let mut stmt = conn.prepare(
    "SELECT
       m.nome, m.uf, m.codigo_ibge, m.slug,
       (SELECT g.area_km2 FROM geografias g
         WHERE g.municipio_id = m.id AND g.area_km2 IS NOT NULL
         ORDER BY g.ano_referencia DESC LIMIT 1),
       (SELECT g.bioma FROM geografias g
         WHERE g.municipio_id = m.id AND g.bioma IS NOT NULL
         ORDER BY g.ano_referencia DESC LIMIT 1),
       (SELECT d.populacao FROM demografias d
         WHERE d.municipio_id = m.id AND d.populacao IS NOT NULL
         ORDER BY d.ano DESC LIMIT 1),
       (SELECT s.idhm FROM socioeconomias s
         WHERE s.municipio_id = m.id AND s.idhm IS NOT NULL
         ORDER BY s.ano DESC LIMIT 1),
       (SELECT s.pib_per_capita_reais FROM socioeconomias s
         WHERE s.municipio_id = m.id AND s.pib_per_capita_reais IS NOT NULL
         ORDER BY s.ano DESC LIMIT 1),
       (SELECT gv.possui_plano_diretor FROM governancas gv
         WHERE gv.municipio_id = m.id)
     FROM municipios m
     ORDER BY m.nome, m.id",
  )?;

  let rows = stmt
    .query_map([], |row| {
      Ok(MunicipalitySummary {
        name:            row.get(0)?,
        region:          row.get(1)?,
        registry_code:   row.get(2)?,
        slug:            row.get(3)?,
        area_km2:        row.get(4)?,
        biome:           row.get(5)?,
        population:      row.get(6)?,
        hdi:             row.get(7)?,
        gdp_per_capita:  row.get(8)?,
        has_master_plan: row.get(9)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// The municipality whose slug equals `slug` ignoring case, with every fact.
pub fn load_view(conn: &Connection, slug: &str) -> Result<Option<MunicipalityView>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {MUNICIPALITY_COLUMNS} FROM municipios WHERE lower(slug) = lower(?1)"
      ),
      rusqlite::params![slug],
      RawMunicipality::from_row,
    )
    .optional()?;

  let Some(raw) = raw else { return Ok(None) };
  let municipality = raw.into_municipality()?;
  let id = municipality.id;

  Ok(Some(MunicipalityView {
    geography: geography(conn, id)?,
    demography: demography(conn, id)?,
    socioeconomics: socioeconomics(conn, id)?,
    agro_census: agro_census(conn, id)?,
    land_cover: land_cover(conn, id)?,
    governance: governance(conn, id)?,
    conflicts: conflicts(conn, id)?,
    municipality,
  }))
}

fn geography(conn: &Connection, id: i64) -> rusqlite::Result<Vec<GeographyFact>> {
  let mut stmt = conn.prepare(
    "SELECT x.ano_referencia, x.area_km2, x.bioma, f.id, f.nome, f.url
     FROM geografias x LEFT JOIN fontes f ON f.id = x.fonte_id
     WHERE x.municipio_id = ?1
     ORDER BY x.ano_referencia",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(GeographyFact {
        year:     row.get(0)?,
        area_km2: row.get(1)?,
        biome:    row.get(2)?,
        source:   decode_source(row.get(3)?, row.get(4)?, row.get(5)?),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn demography(conn: &Connection, id: i64) -> rusqlite::Result<Vec<DemographyFact>> {
  let mut stmt = conn.prepare(
    "SELECT x.ano, x.populacao, x.densidade_hab_km2, f.id, f.nome, f.url
     FROM demografias x LEFT JOIN fontes f ON f.id = x.fonte_id
     WHERE x.municipio_id = ?1
     ORDER BY x.ano",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(DemographyFact {
        year:        row.get(0)?,
        population:  row.get(1)?,
        density_km2: row.get(2)?,
        source:      decode_source(row.get(3)?, row.get(4)?, row.get(5)?),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn socioeconomics(conn: &Connection, id: i64) -> rusqlite::Result<Vec<SocioeconomicsFact>> {
  let mut stmt = conn.prepare(
    "SELECT x.ano, x.idhm, x.pib_total_mil_reais, x.pib_per_capita_reais,
            f.id, f.nome, f.url
     FROM socioeconomias x LEFT JOIN fontes f ON f.id = x.fonte_id
     WHERE x.municipio_id = ?1
     ORDER BY x.ano",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(SocioeconomicsFact {
        year:                row.get(0)?,
        hdi:                 row.get(1)?,
        gdp_total_thousands: row.get(2)?,
        gdp_per_capita:      row.get(3)?,
        source:              decode_source(row.get(4)?, row.get(5)?, row.get(6)?),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn agro_census(conn: &Connection, id: i64) -> rusqlite::Result<Vec<AgroCensusFact>> {
  let mut stmt = conn.prepare(
    "SELECT x.ano, x.numero_estabelecimentos, x.area_total_estabelecimentos_ha,
            x.pessoal_ocupado, x.area_lavouras_ha, x.area_pastagens_ha,
            f.id, f.nome, f.url
     FROM agro_censo x LEFT JOIN fontes f ON f.id = x.fonte_id
     WHERE x.municipio_id = ?1
     ORDER BY x.ano",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(AgroCensusFact {
        year:             row.get(0)?,
        establishments:   row.get(1)?,
        total_area_ha:    row.get(2)?,
        occupied_persons: row.get(3)?,
        crop_area_ha:     row.get(4)?,
        pasture_area_ha:  row.get(5)?,
        source:           decode_source(row.get(6)?, row.get(7)?, row.get(8)?),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn land_cover(conn: &Connection, id: i64) -> rusqlite::Result<Vec<LandCoverFact>> {
  let mut summaries = conn.prepare(
    "SELECT x.id, x.ano_referencia, f.id, f.nome, f.url
     FROM cobertura_uso_solo_resumo x LEFT JOIN fontes f ON f.id = x.fonte_id
     WHERE x.municipio_id = ?1
     ORDER BY x.ano_referencia",
  )?;
  let mut classes = conn.prepare(
    "SELECT classe, area_km2, percentual
     FROM cobertura_uso_solo_classes
     WHERE cobertura_id = ?1
     ORDER BY id",
  )?;

  let mut covers: Vec<LandCoverFact> = summaries
    .query_map(rusqlite::params![id], |row| {
      Ok(LandCoverFact {
        id:      row.get(0)?,
        year:    row.get(1)?,
        source:  decode_source(row.get(2)?, row.get(3)?, row.get(4)?),
        classes: Vec::new(),
      })
    })?
    .collect::<rusqlite::Result<_>>()?;

  for cover in &mut covers {
    cover.classes = classes
      .query_map(rusqlite::params![cover.id], |row| {
        Ok(LandCoverClassFact {
          label:      row.get(0)?,
          area_km2:   row.get(1)?,
          percentage: row.get(2)?,
        })
      })?
      .collect::<rusqlite::Result<_>>()?;
  }
  Ok(covers)
}

fn governance(conn: &Connection, id: i64) -> rusqlite::Result<Option<GovernanceFact>> {
  conn
    .query_row(
      "SELECT x.possui_plano_diretor, x.lei_referencia, x.observacao, f.id, f.nome, f.url
       FROM governancas x LEFT JOIN fontes f ON f.id = x.fonte_id
       WHERE x.municipio_id = ?1",
      rusqlite::params![id],
      |row| {
        Ok(GovernanceFact {
          has_master_plan: row.get(0)?,
          legal_reference: row.get(1)?,
          notes:           row.get(2)?,
          source:          decode_source(row.get(3)?, row.get(4)?, row.get(5)?),
        })
      },
    )
    .optional()
}

fn conflicts(conn: &Connection, id: i64) -> rusqlite::Result<Vec<ConflictFact>> {
  let mut stmt = conn.prepare(
    "SELECT x.id, x.tipo, x.descricao, f.id, f.nome, f.url
     FROM conflitos x LEFT JOIN fontes f ON f.id = x.fonte_id
     WHERE x.municipio_id = ?1
     ORDER BY x.id",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![id], |row| {
      Ok(ConflictFact {
        id:          row.get(0)?,
        kind:        row.get(1)?,
        description: row.get(2)?,
        source:      decode_source(row.get(3)?, row.get(4)?, row.get(5)?),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}
