//! SQLite backend for the Cerrado municipal-data store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Ingestion is split into the
//! source registry ([`sources`]), the entity resolver ([`resolver`]) and the
//! per-domain fact extractors ([`extract`]), all driven from one
//! transaction per document.

mod encode;
mod read;
mod schema;
mod store;

pub mod error;
pub mod extract;
pub mod resolver;
pub mod sources;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
