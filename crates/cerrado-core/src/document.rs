//! Typed schema for per-municipality JSON documents.
//!
//! Documents are loosely structured: any fragment may be missing, `null`, or
//! of an unexpected JSON type. Every field here is an optional lookup and a
//! mismatch decodes to "absent" rather than an error, so decoding a JSON
//! object into [`MunicipalityDocument`] never fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{Error, Result, slug::municipality_slug};

// ─── Leaf decoders ───────────────────────────────────────────────────────────

/// Decode any value into `Some(T)`, or `None` if it has the wrong shape.
fn lenient<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  let value = Value::deserialize(d)?;
  Ok(T::deserialize(integral(value)).ok())
}

/// A year given either as an integer or as a string of digits.
fn lenient_year<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(year_from_value(&Value::deserialize(d)?))
}

/// Registry codes may be written as JSON strings or numbers.
fn lenient_code<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match integral(Value::deserialize(d)?) {
    Value::String(s) => Some(s),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  })
}

/// A list of records; a non-list is empty and non-object elements are dropped.
fn lenient_records<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  Ok(match Value::deserialize(d)? {
    Value::Array(items) => items
      .into_iter()
      .filter(Value::is_object)
      .filter_map(|item| T::deserialize(item).ok())
      .collect(),
    _ => Vec::new(),
  })
}

/// Largest magnitude below which every integral `f64` is exact.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn integral_f64(f: f64) -> Option<i64> {
  (f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER).then_some(f as i64)
}

/// Rewrite an integral float such as `2022.0` as the integer `2022`, so it
/// decodes into integer fields. Every other value is returned unchanged.
fn integral(value: Value) -> Value {
  let as_int = match &value {
    Value::Number(n) if n.is_f64() => n.as_f64().and_then(integral_f64),
    _ => None,
  };
  as_int.map_or(value, Value::from)
}

fn year_from_value(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral_f64)),
    Value::String(s) => parse_year(s),
    _ => None,
  }
}

fn parse_year(s: &str) -> Option<i64> {
  let s = s.trim();
  if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}

fn record<T: DeserializeOwned>(value: Option<&Value>) -> Option<T> {
  value
    .filter(|v| v.is_object())
    .and_then(|v| T::deserialize(v.clone()).ok())
}

// ─── Shared records ──────────────────────────────────────────────────────────

/// The `fonte_nome` / `fonte_url` pair carried by every fact record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceRef {
  #[serde(rename = "fonte_nome", default, deserialize_with = "lenient")]
  pub name: Option<String>,
  #[serde(rename = "fonte_url", default, deserialize_with = "lenient")]
  pub url:  Option<String>,
}

impl SourceRef {
  /// Whether the record names no attribution at all.
  pub fn is_empty(&self) -> bool { self.name.is_none() && self.url.is_none() }
}

/// `{valor, ano_referencia?, fonte_nome?, fonte_url?}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Valued<T> {
  #[serde(rename = "valor", default, deserialize_with = "lenient")]
  pub value:  Option<T>,
  #[serde(rename = "ano_referencia", default, deserialize_with = "lenient_year")]
  pub year:   Option<i64>,
  #[serde(flatten)]
  pub source: SourceRef,
}

// ─── Document ────────────────────────────────────────────────────────────────

/// One municipality document, fragment by fragment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MunicipalityDocument {
  #[serde(rename = "identificacao", default, deserialize_with = "lenient")]
  pub identification: Option<Identification>,
  #[serde(rename = "geografia_territorio", default, deserialize_with = "lenient")]
  pub geography:      Option<GeographyFragment>,
  #[serde(rename = "demografia", default, deserialize_with = "lenient")]
  pub demography:     Option<DemographyFragment>,
  #[serde(rename = "socioeconomia", default, deserialize_with = "lenient")]
  pub socioeconomics: Option<SocioeconomicsFragment>,
  #[serde(rename = "cobertura_uso_solo", default, deserialize_with = "lenient")]
  pub land_cover:     Option<LandCoverFragment>,
  #[serde(rename = "governanca_planejamento", default, deserialize_with = "lenient")]
  pub governance:     Option<GovernanceFragment>,
  #[serde(rename = "conflitos_pressoes", default, deserialize_with = "lenient")]
  pub conflicts:      Option<ConflictsFragment>,
}

/// `identificacao`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Identification {
  #[serde(rename = "nome_municipio", default, deserialize_with = "lenient")]
  pub name:          Option<String>,
  #[serde(rename = "uf", default, deserialize_with = "lenient")]
  pub region:        Option<String>,
  #[serde(rename = "codigo_ibge", default, deserialize_with = "lenient_code")]
  pub registry_code: Option<String>,
}

/// The validated identity fields of a municipality document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKey {
  pub name:          String,
  pub region:        String,
  pub registry_code: String,
}

impl EntityKey {
  pub fn slug(&self) -> String { municipality_slug(&self.name, &self.region) }
}

impl Identification {
  /// Validate the identity fields, trimming surrounding whitespace.
  pub fn entity_key(&self) -> Result<EntityKey> {
    fn required(field: &Option<String>, what: &'static str) -> Result<String> {
      field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or(Error::MalformedEntity(what))
    }

    Ok(EntityKey {
      name:          required(&self.name, "missing municipality name")?,
      region:        required(&self.region, "missing region code")?,
      registry_code: required(&self.registry_code, "missing registry code")?,
    })
  }
}

/// `geografia_territorio`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeographyFragment {
  #[serde(rename = "area_territorial_km2", default, deserialize_with = "lenient")]
  pub area:  Option<Valued<f64>>,
  #[serde(rename = "bioma", default, deserialize_with = "lenient")]
  pub biome: Option<Valued<String>>,
}

impl GeographyFragment {
  /// The area's reference year, else the biome's.
  pub fn reference_year(&self) -> Option<i64> {
    self
      .area
      .as_ref()
      .and_then(|r| r.year)
      .or_else(|| self.biome.as_ref().and_then(|r| r.year))
  }

  /// The area's attribution, else the biome's.
  pub fn source(&self) -> Option<&SourceRef> {
    [self.area.as_ref().map(|r| &r.source), self.biome.as_ref().map(|r| &r.source)]
      .into_iter()
      .flatten()
      .find(|s| !s.is_empty())
  }
}

/// A census population keyed by the year in its document key.
#[derive(Debug, Clone, PartialEq)]
pub struct CensusPopulation {
  pub key_year: i64,
  pub record:   Valued<i64>,
}

impl CensusPopulation {
  /// The record's own reference year wins over the key's suffix.
  pub fn year(&self) -> i64 { self.record.year.unwrap_or(self.key_year) }
}

/// `demografia`: a density record plus `populacao_censo_<YEAR>` entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct DemographyFragment {
  pub density:     Option<Valued<f64>>,
  /// Census populations ordered by key year.
  pub populations: Vec<CensusPopulation>,
}

const DENSITY_KEY: &str = "densidade_demografica_hab_km2";
const CENSUS_KEY_PREFIX: &str = "populacao_censo_";

impl From<Map<String, Value>> for DemographyFragment {
  fn from(map: Map<String, Value>) -> Self {
    let density = record(map.get(DENSITY_KEY));
    let mut populations: Vec<CensusPopulation> = map
      .iter()
      .filter_map(|(key, value)| {
        let key_year = parse_year(key.strip_prefix(CENSUS_KEY_PREFIX)?)?;
        Some(CensusPopulation { key_year, record: record(Some(value))? })
      })
      .collect();
    populations.sort_by_key(|p| p.key_year);
    Self { density, populations }
  }
}

/// `socioeconomia`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SocioeconomicsFragment {
  #[serde(rename = "idhm_2010", default, deserialize_with = "lenient")]
  pub hdi:            Option<Valued<f64>>,
  #[serde(rename = "pib_per_capita_reais", default, deserialize_with = "lenient")]
  pub gdp_per_capita: Option<Valued<f64>>,
  #[serde(rename = "pib_total_mil_reais", default, deserialize_with = "lenient")]
  pub gdp_total:      Option<Valued<f64>>,
  #[serde(rename = "censo_agropecuario_2017", default, deserialize_with = "lenient")]
  pub agro_census:    Option<AgroCensusRecord>,
}

/// Reference year of the HDI record when it carries none of its own.
pub const HDI_DEFAULT_YEAR: i64 = 2010;
/// Reference year of the agricultural census when it carries none.
pub const AGRO_CENSUS_DEFAULT_YEAR: i64 = 2017;

/// `socioeconomia.censo_agropecuario_2017`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgroCensusRecord {
  #[serde(rename = "ano_referencia", default, deserialize_with = "lenient_year")]
  pub year:              Option<i64>,
  #[serde(rename = "numero_estabelecimentos", default, deserialize_with = "lenient")]
  pub establishments:    Option<i64>,
  #[serde(rename = "area_total_estabelecimentos_ha", default, deserialize_with = "lenient")]
  pub total_area_ha:     Option<f64>,
  #[serde(rename = "pessoal_ocupado", default, deserialize_with = "lenient")]
  pub occupied_persons:  Option<i64>,
  #[serde(rename = "area_lavouras_ha", default, deserialize_with = "lenient")]
  pub crop_area_ha:      Option<f64>,
  #[serde(rename = "area_pastagens_ha", default, deserialize_with = "lenient")]
  pub pasture_area_ha:   Option<f64>,
  #[serde(flatten)]
  pub source:            SourceRef,
}

/// `cobertura_uso_solo`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LandCoverFragment {
  #[serde(rename = "dados_gerais", default, deserialize_with = "lenient")]
  pub general: Option<LandCoverGeneral>,
  #[serde(default, deserialize_with = "lenient_records")]
  pub classes: Vec<LandCoverClass>,
}

/// `cobertura_uso_solo.dados_gerais`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LandCoverGeneral {
  #[serde(rename = "ano_referencia", default, deserialize_with = "lenient_year")]
  pub year:   Option<i64>,
  #[serde(flatten)]
  pub source: SourceRef,
}

/// One entry of `cobertura_uso_solo.classes`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LandCoverClass {
  #[serde(rename = "classe", default, deserialize_with = "lenient")]
  pub label:      Option<String>,
  #[serde(rename = "area_km2", default, deserialize_with = "lenient")]
  pub area_km2:   Option<f64>,
  #[serde(rename = "percentual", default, deserialize_with = "lenient")]
  pub percentage: Option<f64>,
}

/// `governanca_planejamento`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GovernanceFragment {
  #[serde(rename = "plano_diretor", default, deserialize_with = "lenient")]
  pub master_plan: Option<MasterPlanRecord>,
}

/// `governanca_planejamento.plano_diretor`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MasterPlanRecord {
  #[serde(rename = "existe", default, deserialize_with = "lenient")]
  pub exists:          Option<bool>,
  #[serde(rename = "lei_referencia", default, deserialize_with = "lenient")]
  pub legal_reference: Option<String>,
  #[serde(rename = "observacao", default, deserialize_with = "lenient")]
  pub notes:           Option<String>,
  #[serde(flatten)]
  pub source:          SourceRef,
}

/// `conflitos_pressoes`: conflict type → record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ConflictsFragment {
  pub entries: BTreeMap<String, ConflictRecord>,
}

impl From<Map<String, Value>> for ConflictsFragment {
  fn from(map: Map<String, Value>) -> Self {
    let entries = map
      .into_iter()
      .filter_map(|(kind, value)| Some((kind, record(Some(&value))?)))
      .collect();
    Self { entries }
  }
}

/// One value of `conflitos_pressoes`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConflictRecord {
  #[serde(rename = "descricao", default, deserialize_with = "lenient")]
  pub description: Option<String>,
  #[serde(flatten)]
  pub source:      SourceRef,
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Outcome of the shape check applied to every parsed file.
#[derive(Debug, Clone)]
pub enum Classification {
  Municipality(Box<MunicipalityDocument>),
  /// Well-formed JSON that is not a municipality document.
  Skipped(&'static str),
}

/// Decide whether `value` is a municipality document.
///
/// A municipality document is an object whose `identificacao` fragment is an
/// object with a non-empty `codigo_ibge`.
pub fn classify(value: Value) -> Result<Classification> {
  let Some(object) = value.as_object() else {
    return Ok(Classification::Skipped("document is not an object"));
  };
  let Some(ident) = object.get("identificacao").and_then(Value::as_object) else {
    return Ok(Classification::Skipped("no identification fragment"));
  };
  let has_code = match ident.get("codigo_ibge") {
    Some(Value::String(s)) => !s.trim().is_empty(),
    Some(Value::Number(_)) => true,
    _ => false,
  };
  if !has_code {
    return Ok(Classification::Skipped("identification has no registry code"));
  }

  let document = serde_json::from_value(value)?;
  Ok(Classification::Municipality(Box::new(document)))
}
