//! The `MunicipalityStore` trait and ingestion result types.
//!
//! The trait is implemented by storage backends (e.g. `cerrado-store-sqlite`).
//! The ingestion orchestrator and the web layer depend on this abstraction,
//! not on any concrete backend.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};

use crate::{
  document::MunicipalityDocument,
  municipality::{Municipality, MunicipalitySummary, MunicipalityView},
};

// ─── Ingestion result ────────────────────────────────────────────────────────

/// Number of fact rows written per domain while ingesting one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactCounts {
  pub geography:          usize,
  pub demography:         usize,
  pub socioeconomics:     usize,
  pub agro_census:        usize,
  pub land_cover:         usize,
  pub land_cover_classes: usize,
  pub governance:         usize,
  pub conflicts:          usize,
}

impl FactCounts {
  pub fn total(&self) -> usize {
    self.geography
      + self.demography
      + self.socioeconomics
      + self.agro_census
      + self.land_cover
      + self.land_cover_classes
      + self.governance
      + self.conflicts
  }
}

impl fmt::Display for FactCounts {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "geography={} demography={} socioeconomics={} agro_census={} \
       land_cover={} (classes={}) governance={} conflicts={}",
      self.geography,
      self.demography,
      self.socioeconomics,
      self.agro_census,
      self.land_cover,
      self.land_cover_classes,
      self.governance,
      self.conflicts,
    )
  }
}

/// The committed result of ingesting one municipality document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedDocument {
  pub municipality_id: i64,
  pub registry_code:   String,
  pub slug:            String,
  /// `false` when the registry code was already known.
  pub created:         bool,
  pub facts:           FactCounts,
}

impl fmt::Display for IngestedDocument {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {} ({}): {}",
      if self.created { "created" } else { "updated" },
      self.registry_code,
      self.slug,
      self.facts,
    )
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a municipal-data store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MunicipalityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Ingest one document inside a single transaction.
  ///
  /// The municipality is resolved by registry code (created on first
  /// sight, never renamed), then every present fragment is upserted. Any
  /// error rolls back everything this document wrote.
  fn ingest_document(
    &self,
    document: MunicipalityDocument,
  ) -> impl Future<Output = Result<IngestedDocument, Self::Error>> + Send + '_;

  /// All municipalities, ordered by name.
  fn list_municipalities(
    &self,
  ) -> impl Future<Output = Result<Vec<Municipality>, Self::Error>> + Send + '_;

  /// Headline indicators for every municipality, ordered by name.
  fn list_summaries(
    &self,
  ) -> impl Future<Output = Result<Vec<MunicipalitySummary>, Self::Error>> + Send + '_;

  /// A municipality and all its facts. The slug match ignores case.
  fn get_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<MunicipalityView>, Self::Error>> + Send + 'a;

  /// Delete a municipality and, by cascade, every fact row it owns.
  /// Returns `false` if the registry code is unknown.
  fn delete_municipality<'a>(
    &'a self,
    registry_code: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
