use std::path::Path as FsPath;

use axum::{
  Json,
  extract::{Path, State},
};
use cerrado_core::{
  document::Classification,
  ingest::{list_documents, load_document},
  municipality::{MunicipalitySummary, MunicipalityView},
  store::MunicipalityStore,
};
use serde::Serialize;

use crate::{AppState, error::Error};

/// Where a detail response came from.
#[derive(Debug, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum MunicipalityDetail {
  Storage(MunicipalityView),
  Document(MunicipalitySummary),
}

// ─── Document fallback ───────────────────────────────────────────────────────

/// Summaries built straight from the documents in `dir`, in file-name order.
///
/// Nothing is written to storage. Unreadable files and non-municipality
/// documents are left out.
pub async fn document_summaries(dir: &FsPath) -> Vec<MunicipalitySummary> {
  let paths = match list_documents(dir).await {
    Ok(paths) => paths,
    Err(e) => {
      tracing::warn!(error = %e, "documents directory unavailable");
      return Vec::new();
    }
  };

  let mut summaries = Vec::new();
  for path in paths {
    match load_document(&path).await {
      Ok(Classification::Municipality(doc)) => {
        summaries.extend(MunicipalitySummary::from_document(&doc));
      }
      Ok(Classification::Skipped(_)) => {}
      Err(diagnostic) => {
        tracing::debug!(file = %path.display(), %diagnostic, "document ignored");
      }
    }
  }
  summaries
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /api/municipios`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<MunicipalitySummary>>, Error>
where
  S: MunicipalityStore + Clone + 'static,
{
  let summaries = state.store.list_summaries().await.map_err(Error::store)?;
  if !summaries.is_empty() {
    return Ok(Json(summaries));
  }

  match &state.config.documents_dir {
    Some(dir) => {
      tracing::info!(dir = %dir.display(), "storage empty; summarising documents");
      Ok(Json(document_summaries(dir).await))
    }
    None => Ok(Json(summaries)),
  }
}

// ─── Detail ──────────────────────────────────────────────────────────────────

/// `GET /api/municipios/{slug}`
pub async fn detail<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
) -> Result<Json<MunicipalityDetail>, Error>
where
  S: MunicipalityStore + Clone + 'static,
{
  if let Some(view) = state.store.get_by_slug(&slug).await.map_err(Error::store)? {
    return Ok(Json(MunicipalityDetail::Storage(view)));
  }

  if let Some(dir) = &state.config.documents_dir {
    let found = document_summaries(dir)
      .await
      .into_iter()
      .find(|s| s.slug.eq_ignore_ascii_case(&slug));
    if let Some(summary) = found {
      return Ok(Json(MunicipalityDetail::Document(summary)));
    }
  }

  Err(Error::NotFound(format!("municipality {slug}")))
}
