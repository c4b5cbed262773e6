//! Directory ingestion: one transaction per file, never aborting the batch.

use std::{
  fmt,
  path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  document::{Classification, classify},
  store::MunicipalityStore,
};

/// Extension of the files picked up from an ingestion directory.
pub const DOCUMENT_EXTENSION: &str = "json";

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
  Ok,
  Skipped,
  Error,
}

impl fmt::Display for FileStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      FileStatus::Ok => "OK",
      FileStatus::Skipped => "SKIPPED",
      FileStatus::Error => "ERROR",
    })
  }
}

/// What happened to one file of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
  pub filename: String,
  pub status:   FileStatus,
  pub detail:   String,
}

/// Per-file outcomes in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
  pub outcomes: Vec<FileOutcome>,
}

impl IngestReport {
  pub fn count(&self, status: FileStatus) -> usize {
    self.outcomes.iter().filter(|o| o.status == status).count()
  }

  pub fn statuses(&self) -> Vec<FileStatus> {
    self.outcomes.iter().map(|o| o.status).collect()
  }
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// The `.json` entries directly inside `dir` that are not directories,
/// symlinks included, sorted by file name.
pub async fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
  let dir_error = |source| Error::Directory { path: dir.to_path_buf(), source };

  let mut entries = tokio::fs::read_dir(dir).await.map_err(dir_error)?;
  let mut paths = Vec::new();
  while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
    let path = entry.path();
    let is_document = path
      .extension()
      .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION));
    // `metadata` follows symlinks. A dangling link is kept so that reading
    // it shows up in the report as an error.
    let is_dir = tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir());
    if is_document && !is_dir {
      paths.push(path);
    }
  }
  paths.sort();
  Ok(paths)
}

/// Read and classify one file without writing anything.
///
/// Read and JSON errors come back as `Err` with a printable diagnostic.
pub async fn load_document(path: &Path) -> Result<Classification, String> {
  let bytes = tokio::fs::read(path)
    .await
    .map_err(|e| format!("read error: {e}"))?;
  let value: serde_json::Value =
    serde_json::from_slice(&bytes).map_err(|e| format!("parse error: {e}"))?;
  classify(value).map_err(|e| e.to_string())
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Ingest every document in `dir` into `store`.
///
/// Files are processed one at a time in file-name order. Each accepted
/// document is written in its own transaction; a failure is recorded in the
/// report and the batch moves on. Only an unreadable directory fails the
/// call as a whole.
pub async fn ingest_directory<S>(store: &S, dir: &Path) -> Result<IngestReport>
where
  S: MunicipalityStore,
{
  let paths = list_documents(dir).await?;
  tracing::info!(dir = %dir.display(), files = paths.len(), "starting ingestion");

  let mut report = IngestReport::default();
  for path in paths {
    let filename = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());

    let (status, detail) = match load_document(&path).await {
      Err(diagnostic) => (FileStatus::Error, diagnostic),
      Ok(Classification::Skipped(reason)) => (FileStatus::Skipped, reason.to_owned()),
      Ok(Classification::Municipality(document)) => {
        match store.ingest_document(*document).await {
          Ok(ingested) => (FileStatus::Ok, ingested.to_string()),
          Err(e) => (FileStatus::Error, e.to_string()),
        }
      }
    };

    match status {
      FileStatus::Ok => tracing::info!(file = %filename, %detail, "ingested"),
      FileStatus::Skipped => tracing::debug!(file = %filename, %detail, "skipped"),
      FileStatus::Error => tracing::warn!(file = %filename, %detail, "ingestion failed"),
    }
    report.outcomes.push(FileOutcome { filename, status, detail });
  }

  tracing::info!(
    ok = report.count(FileStatus::Ok),
    skipped = report.count(FileStatus::Skipped),
    errors = report.count(FileStatus::Error),
    "ingestion finished"
  );
  Ok(report)
}
