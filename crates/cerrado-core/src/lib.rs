//! Core types and trait definitions for the Cerrado municipal-data site.
//!
//! Holds the typed schema of municipality documents, the read model, the
//! storage trait, and the directory ingestion orchestrator. This crate is
//! free of HTTP and database dependencies.

pub mod document;
pub mod error;
pub mod ingest;
pub mod municipality;
pub mod slug;
pub mod store;

pub use error::{Error, Result};
