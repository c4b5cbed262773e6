//! JSON endpoint handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/municipios` | Summaries; falls back to the documents directory |
//! | `GET`  | `/api/municipios/{slug}` | Full view, or a document summary; 404 otherwise |
//! | `GET`  | `/api/municipio_ibge/{codigo}` | Registry passthrough |

pub mod municipalities;
pub mod registry;
