use axum::{
  Json,
  extract::{Path, State},
};
use cerrado_core::store::MunicipalityStore;

use crate::{AppState, error::Error, ibge::RegistryMunicipality};

/// `GET /api/municipio_ibge/{codigo}`
pub async fn lookup<S>(
  State(state): State<AppState<S>>,
  Path(codigo): Path<String>,
) -> Result<Json<RegistryMunicipality>, Error>
where
  S: MunicipalityStore + Clone + 'static,
{
  let code: u64 = codigo
    .parse()
    .map_err(|_| Error::BadRequest(format!("invalid registry code {codigo:?}")))?;

  let municipality = state.ibge.municipality(code).await?;
  Ok(Json(municipality))
}
