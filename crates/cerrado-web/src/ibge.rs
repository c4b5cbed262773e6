//! Client for the IBGE Localidades municipality registry.
//!
//! Only the identification fields are taken from the upstream record;
//! the indicator block is reserved and always null.

use std::{borrow::Cow, io::Read as _, time::Duration};

use flate2::read::GzDecoder;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";
pub const SOURCE_NAME: &str = "IBGE Localidades";
const USER_AGENT: &str = "ProjetoCerrado/1.0";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Error)]
pub enum IbgeError {
  #[error("HTTP {0} from IBGE Localidades")]
  Status(u16),

  #[error("connection to IBGE failed: {0}")]
  Connection(#[source] reqwest::Error),

  #[error("unexpected error: {0}")]
  Unexpected(String),
}

/// Registry record as served by `/api/municipio_ibge/{codigo}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryMunicipality {
  #[serde(rename = "codigo_ibge")]
  pub registry_code: String,
  #[serde(rename = "nome")]
  pub name:          Option<String>,
  #[serde(rename = "uf")]
  pub region:        Option<String>,
  #[serde(rename = "fonte")]
  pub source:        String,
  #[serde(rename = "indicadores")]
  pub indicators:    RegistryIndicators,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryIndicators {
  #[serde(rename = "populacao")]
  pub population: Option<i64>,
  pub area_km2:   Option<f64>,
  #[serde(rename = "densidade")]
  pub density:    Option<f64>,
}

/// Reduce an upstream municipality record to the fields we serve.
pub fn normalize(code: u64, record: &Value) -> RegistryMunicipality {
  let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_owned);
  RegistryMunicipality {
    registry_code: code.to_string(),
    name:          text(record.get("nome")),
    region:        text(record.pointer("/microrregiao/mesorregiao/UF/sigla")),
    source:        SOURCE_NAME.to_owned(),
    indicators:    RegistryIndicators::default(),
  }
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct IbgeClient {
  client:   Client,
  base_url: String,
}

impl IbgeClient {
  pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
    let client = Client::builder()
      .user_agent(USER_AGENT)
      .timeout(timeout)
      .gzip(true)
      .build()?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, code: u64) -> String {
    format!("{}/municipios/{code}", self.base_url.trim_end_matches('/'))
  }

  /// `GET {base}/municipios/{code}`, normalized.
  pub async fn municipality(&self, code: u64) -> Result<RegistryMunicipality, IbgeError> {
    let resp = self
      .client
      .get(self.url(code))
      .header(header::ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| {
        if e.is_builder() {
          IbgeError::Unexpected(e.to_string())
        } else {
          IbgeError::Connection(e)
        }
      })?;

    let status = resp.status();
    if !status.is_success() {
      return Err(IbgeError::Status(status.as_u16()));
    }

    let body = resp
      .bytes()
      .await
      .map_err(|e| IbgeError::Unexpected(e.to_string()))?;
    let record: Value = serde_json::from_slice(&decode_body(&body)?)
      .map_err(|e| IbgeError::Unexpected(e.to_string()))?;
    Ok(normalize(code, &record))
  }
}

/// Decompress a gzip body that arrived without `Content-Encoding`.
///
/// The registry sometimes sends one; bodies marked as gzip are already
/// decoded by the client.
pub fn decode_body(body: &[u8]) -> Result<Cow<'_, [u8]>, IbgeError> {
  if !body.starts_with(&GZIP_MAGIC) {
    return Ok(Cow::Borrowed(body));
  }
  let mut decoded = Vec::new();
  GzDecoder::new(body)
    .read_to_end(&mut decoded)
    .map_err(|e| IbgeError::Unexpected(format!("gzip: {e}")))?;
  Ok(Cow::Owned(decoded))
}
