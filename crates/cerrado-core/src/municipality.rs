//! Read model: municipalities, their sources, and their facts.
//!
//! These are the shapes returned by [`MunicipalityStore`](crate::store::MunicipalityStore)
//! reads and serialised by the web layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::MunicipalityDocument;

// ─── Entities ────────────────────────────────────────────────────────────────

/// A municipality row. Identity fields are fixed at first ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
  pub id:            i64,
  pub slug:          String,
  pub name:          String,
  pub region:        String,
  pub registry_code: String,
  pub notes:         Option<String>,
  pub created_at:    DateTime<Utc>,
}

/// An attribution record shared by many fact rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub id:   i64,
  pub name: String,
  pub url:  Option<String>,
}

// ─── Facts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographyFact {
  pub year:     i64,
  pub area_km2: Option<f64>,
  pub biome:    Option<String>,
  pub source:   Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographyFact {
  pub year:        i64,
  pub population:  Option<i64>,
  pub density_km2: Option<f64>,
  pub source:      Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocioeconomicsFact {
  pub year:                i64,
  pub hdi:                 Option<f64>,
  pub gdp_total_thousands: Option<f64>,
  pub gdp_per_capita:      Option<f64>,
  pub source:              Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgroCensusFact {
  pub year:             i64,
  pub establishments:   Option<i64>,
  pub total_area_ha:    Option<f64>,
  pub occupied_persons: Option<i64>,
  pub crop_area_ha:     Option<f64>,
  pub pasture_area_ha:  Option<f64>,
  pub source:           Option<Source>,
}

/// A land-cover summary and its class breakdown, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandCoverFact {
  pub id:      i64,
  pub year:    i64,
  pub source:  Option<Source>,
  pub classes: Vec<LandCoverClassFact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandCoverClassFact {
  pub label:      String,
  pub area_km2:   Option<f64>,
  pub percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceFact {
  pub has_master_plan: Option<bool>,
  pub legal_reference: Option<String>,
  pub notes:           Option<String>,
  pub source:          Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictFact {
  pub id:          i64,
  pub kind:        String,
  pub description: Option<String>,
  pub source:      Option<Source>,
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// A municipality together with every fact row it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityView {
  pub municipality:   Municipality,
  pub geography:      Vec<GeographyFact>,
  pub demography:     Vec<DemographyFact>,
  pub socioeconomics: Vec<SocioeconomicsFact>,
  pub agro_census:    Vec<AgroCensusFact>,
  pub land_cover:     Vec<LandCoverFact>,
  pub governance:     Option<GovernanceFact>,
  pub conflicts:      Vec<ConflictFact>,
}

/// The headline indicators shown on the municipality list.
///
/// Each indicator is taken from the most recent year that has it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalitySummary {
  pub name:            String,
  pub region:          String,
  pub registry_code:   String,
  pub slug:            String,
  pub area_km2:        Option<f64>,
  pub biome:           Option<String>,
  pub population:      Option<i64>,
  pub hdi:             Option<f64>,
  pub gdp_per_capita:  Option<f64>,
  pub has_master_plan: Option<bool>,
}

impl MunicipalitySummary {
  /// Build a summary straight from a document, without touching storage.
  ///
  /// Returns `None` when the identification fragment is incomplete, which
  /// is exactly when ingestion would reject the document.
  pub fn from_document(doc: &MunicipalityDocument) -> Option<Self> {
    let key = doc.identification.as_ref()?.entity_key().ok()?;

    // Geography and GDP rows are only stored when a reference year resolves.
    let geography = doc
      .geography
      .as_ref()
      .filter(|g| g.reference_year().is_some());
    let socio = doc.socioeconomics.as_ref();

    let population = doc.demography.as_ref().and_then(|d| {
      d.populations
        .iter()
        .filter_map(|p| Some((p.year(), p.record.value?)))
        .max_by_key(|(year, _)| *year)
        .map(|(_, value)| value)
    });

    let hdi = socio.and_then(|s| s.hdi.as_ref()).and_then(|r| r.value);
    let gdp_per_capita = socio
      .and_then(|s| s.gdp_per_capita.as_ref())
      .filter(|r| r.year.is_some())
      .and_then(|r| r.value);

    Some(Self {
      slug: key.slug(),
      name: key.name,
      region: key.region,
      registry_code: key.registry_code,
      area_km2: geography.and_then(|g| g.area.as_ref()).and_then(|r| r.value),
      biome: geography
        .and_then(|g| g.biome.as_ref())
        .and_then(|r| r.value.clone()),
      population,
      hdi,
      gdp_per_capita,
      has_master_plan: doc
        .governance
        .as_ref()
        .and_then(|g| g.master_plan.as_ref())
        .and_then(|p| p.exists),
    })
  }
}
