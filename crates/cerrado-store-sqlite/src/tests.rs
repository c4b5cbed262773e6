//! Integration tests for `SqliteStore` against an in-memory database.

use std::path::Path;

use cerrado_core::{
  document::{MunicipalityDocument, SourceRef},
  ingest::{FileStatus, ingest_directory},
  municipality::MunicipalitySummary,
  store::MunicipalityStore,
};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{SqliteStore, schema::SCHEMA, sources::resolve_source};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn doc(value: Value) -> MunicipalityDocument {
  serde_json::from_value(value).expect("document")
}

fn cavalcante() -> Value {
  json!({
    "identificacao": {"nome_municipio": "Cavalcante", "uf": "GO", "codigo_ibge": "5205304"},
    "geografia_territorio": {"area_territorial_km2": {"valor": 6953.65, "ano_referencia": 2022}}
  })
}

async fn count(s: &SqliteStore, table: &'static str) -> i64 {
  s.with_connection(move |c| {
    c.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
  })
  .await
  .unwrap()
}

// ─── End to end ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_end_to_end_example() {
  let s = store().await;

  let ingested = s.ingest_document(doc(cavalcante())).await.unwrap();
  assert!(ingested.created);
  assert_eq!(ingested.slug, "cavalcante-go");
  assert_eq!(ingested.registry_code, "5205304");
  assert_eq!(ingested.facts.geography, 1);
  assert_eq!(ingested.facts.total(), 1);

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  assert_eq!(view.municipality.name, "Cavalcante");
  assert_eq!(view.municipality.region, "GO");
  assert_eq!(view.geography.len(), 1);
  assert_eq!(view.geography[0].year, 2022);
  assert_eq!(view.geography[0].area_km2, Some(6953.65));
  assert_eq!(view.geography[0].source, None);
  assert_eq!(count(&s, "fontes").await, 0);
}

#[tokio::test]
async fn get_by_slug_ignores_case_and_misses_return_none() {
  let s = store().await;
  s.ingest_document(doc(cavalcante())).await.unwrap();

  assert!(s.get_by_slug("Cavalcante-GO").await.unwrap().is_some());
  assert!(s.get_by_slug("nowhere-go").await.unwrap().is_none());
}

// ─── Entity resolution ───────────────────────────────────────────────────────

#[tokio::test]
async fn ingesting_twice_keeps_one_municipality() {
  let s = store().await;

  let first = s.ingest_document(doc(cavalcante())).await.unwrap();
  let second = s.ingest_document(doc(cavalcante())).await.unwrap();

  assert!(first.created);
  assert!(!second.created);
  assert_eq!(first.municipality_id, second.municipality_id);
  assert_eq!(s.list_municipalities().await.unwrap().len(), 1);
  assert_eq!(count(&s, "geografias").await, 1);
}

#[tokio::test]
async fn identity_fields_are_first_write_wins() {
  let s = store().await;
  s.ingest_document(doc(cavalcante())).await.unwrap();

  let renamed = s
    .ingest_document(doc(json!({
      "identificacao": {"nome_municipio": "Cavalcante (GO)", "uf": "go", "codigo_ibge": 5205304}
    })))
    .await
    .unwrap();
  assert_eq!(renamed.slug, "cavalcante-go");

  let all = s.list_municipalities().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].name, "Cavalcante");
  assert_eq!(all[0].region, "GO");
}

#[tokio::test]
async fn malformed_identification_is_rejected() {
  let s = store().await;
  let result = s
    .ingest_document(doc(json!({
      "identificacao": {"uf": "GO", "codigo_ibge": "5205304"}
    })))
    .await;

  let err = result.unwrap_err();
  assert!(err.to_string().contains("malformed entity"), "{err}");
  assert_eq!(count(&s, "municipios").await, 0);
}

// ─── Source registry ─────────────────────────────────────────────────────────

fn schema_conn() -> Connection {
  let conn = Connection::open_in_memory().unwrap();
  conn.execute_batch(SCHEMA).unwrap();
  conn
}

const NOW: &str = "2024-01-01T00:00:00+00:00";

#[test]
fn resolve_source_dedups_same_pair() {
  let conn = schema_conn();
  let url = Some("https://www.ibge.gov.br");

  let a = resolve_source(&conn, Some("IBGE"), url, NOW).unwrap();
  let b = resolve_source(&conn, Some("IBGE"), url, NOW).unwrap();
  assert!(a.is_some());
  assert_eq!(a, b);
}

#[test]
fn resolve_source_without_attribution_is_none() {
  let conn = schema_conn();
  assert_eq!(resolve_source(&conn, None, None, NOW).unwrap(), None);

  let count: i64 = conn.query_row("SELECT COUNT(*) FROM fontes", [], |r| r.get(0)).unwrap();
  assert_eq!(count, 0);
}

#[test]
fn resolve_source_fields_act_as_filters() {
  let conn = schema_conn();

  let with_url = resolve_source(&conn, Some("IBGE"), Some("https://ibge.gov.br"), NOW).unwrap();
  // Name alone matches the existing row: the URL filter is not applied.
  let name_only = resolve_source(&conn, Some("IBGE"), None, NOW).unwrap();
  assert_eq!(with_url, name_only);

  // A different URL is a different filter and a different row.
  let other_url = resolve_source(&conn, Some("IBGE"), Some("https://sidra.ibge.gov.br"), NOW).unwrap();
  assert_ne!(with_url, other_url);
}

#[test]
fn resolve_source_url_only_defaults_name_to_empty() {
  let conn = schema_conn();
  let id = resolve_source(&conn, None, Some("https://mapbiomas.org"), NOW)
    .unwrap()
    .unwrap();

  let name: String = conn
    .query_row("SELECT nome FROM fontes WHERE id = ?1", [id], |r| r.get(0))
    .unwrap();
  assert_eq!(name, "");
}

#[test]
fn resolve_source_ref_reads_document_pair() {
  let conn = schema_conn();
  let source = SourceRef { name: Some("Atlas Brasil".into()), url: None };

  let a = crate::sources::resolve_source_ref(&conn, Some(&source), NOW).unwrap();
  let b = crate::sources::resolve_source_ref(&conn, Some(&source), NOW).unwrap();
  assert!(a.is_some());
  assert_eq!(a, b);
  assert_eq!(crate::sources::resolve_source_ref(&conn, None, NOW).unwrap(), None);
}

#[tokio::test]
async fn sources_are_shared_across_municipalities() {
  let s = store().await;
  for (name, code) in [("Cavalcante", "5205304"), ("Cidade Ocidental", "5205494")] {
    s.ingest_document(doc(json!({
      "identificacao": {"nome_municipio": name, "uf": "GO", "codigo_ibge": code},
      "geografia_territorio": {
        "bioma": {"valor": "Cerrado", "ano_referencia": 2019, "fonte_nome": "IBGE", "fonte_url": "https://www.ibge.gov.br"}
      }
    })))
    .await
    .unwrap();
  }

  assert_eq!(count(&s, "geografias").await, 2);
  assert_eq!(count(&s, "fontes").await, 1);
}

// ─── Fact extractors ─────────────────────────────────────────────────────────

#[tokio::test]
async fn land_cover_writes_summary_and_classes() {
  let s = store().await;
  let mut value = cavalcante();
  value["cobertura_uso_solo"] = json!({
    "dados_gerais": {"ano_referencia": 2022, "fonte_nome": "MapBiomas", "fonte_url": "https://mapbiomas.org"},
    "classes": [
      {"classe": "Vegetação Nativa", "area_km2": 5800.1, "percentual": 83.4},
      {"classe": "Pastagem", "area_km2": 900.0, "percentual": 12.9},
      {"classe": "Agricultura", "area_km2": 150.5, "percentual": 2.2}
    ]
  });

  let ingested = s.ingest_document(doc(value.clone())).await.unwrap();
  assert_eq!(ingested.facts.land_cover, 1);
  assert_eq!(ingested.facts.land_cover_classes, 3);
  assert_eq!(count(&s, "cobertura_uso_solo_resumo").await, 1);
  assert_eq!(count(&s, "cobertura_uso_solo_classes").await, 3);

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  let cover = &view.land_cover[0];
  let labels: Vec<&str> = cover.classes.iter().map(|c| c.label.as_str()).collect();
  assert_eq!(labels, ["Vegetação Nativa", "Pastagem", "Agricultura"]);
  assert_eq!(cover.source.as_ref().unwrap().name, "MapBiomas");

  // Re-ingest with a non-list `classes`: same summary, no children, no error.
  value["cobertura_uso_solo"]["classes"] = json!("indisponível");
  let again = s.ingest_document(doc(value)).await.unwrap();
  assert_eq!(again.facts.land_cover_classes, 0);
  assert_eq!(count(&s, "cobertura_uso_solo_resumo").await, 1);
  assert_eq!(count(&s, "cobertura_uso_solo_classes").await, 0);

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  assert_eq!(view.land_cover[0].id, cover.id);
  assert!(view.land_cover[0].classes.is_empty());
}

#[tokio::test]
async fn land_cover_without_year_is_skipped() {
  let s = store().await;
  let mut value = cavalcante();
  value["cobertura_uso_solo"] = json!({"classes": [{"classe": "Pastagem"}]});

  let ingested = s.ingest_document(doc(value)).await.unwrap();
  assert_eq!(ingested.facts.land_cover, 0);
  assert_eq!(count(&s, "cobertura_uso_solo_classes").await, 0);
}

#[tokio::test]
async fn conflicts_append_on_every_ingestion() {
  let s = store().await;
  let mut value = cavalcante();
  value["conflitos_pressoes"] = json!({
    "crescimento_desordenado": {"descricao": "Loteamentos irregulares"},
    "desmatamento": {"descricao": "Supressão de vegetação", "fonte_nome": "MapBiomas"},
    "mineracao": {"descricao": "Garimpo em APP"}
  });

  s.ingest_document(doc(value.clone())).await.unwrap();
  s.ingest_document(doc(value)).await.unwrap();

  assert_eq!(count(&s, "conflitos").await, 6);
  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  assert_eq!(view.conflicts.len(), 6);
  assert_eq!(
    view.conflicts.iter().filter(|c| c.kind == "desmatamento").count(),
    2
  );
}

#[tokio::test]
async fn upsert_replaces_the_whole_row() {
  let s = store().await;
  let mut value = cavalcante();
  value["governanca_planejamento"] = json!({
    "plano_diretor": {"existe": true, "lei_referencia": "Lei Complementar 1/2007", "fonte_nome": "Prefeitura"}
  });
  s.ingest_document(doc(value.clone())).await.unwrap();

  value["governanca_planejamento"] = json!({"plano_diretor": {"existe": false}});
  s.ingest_document(doc(value)).await.unwrap();

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  let gov = view.governance.unwrap();
  assert_eq!(gov.has_master_plan, Some(false));
  assert_eq!(gov.legal_reference, None);
  assert_eq!(gov.source, None);
  assert_eq!(count(&s, "governancas").await, 1);
}

#[tokio::test]
async fn socioeconomic_records_of_one_year_share_a_row() {
  let s = store().await;
  let mut value = cavalcante();
  value["socioeconomia"] = json!({
    "idhm_2010": {"valor": 0.563, "fonte_nome": "Atlas Brasil"},
    "pib_per_capita_reais": {"valor": 9800.0, "ano_referencia": 2010},
    "pib_total_mil_reais": {"valor": 91000.0, "ano_referencia": 2021},
    "censo_agropecuario_2017": {"numero_estabelecimentos": 640, "pessoal_ocupado": 1850, "area_pastagens_ha": 41000.5}
  });

  let ingested = s.ingest_document(doc(value)).await.unwrap();
  assert_eq!(ingested.facts.socioeconomics, 2);
  assert_eq!(ingested.facts.agro_census, 1);

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  let y2010 = &view.socioeconomics[0];
  assert_eq!(y2010.year, 2010);
  assert_eq!(y2010.hdi, Some(0.563));
  assert_eq!(y2010.gdp_per_capita, Some(9800.0));
  assert_eq!(y2010.source.as_ref().unwrap().name, "Atlas Brasil");
  assert_eq!(view.socioeconomics[1].gdp_total_thousands, Some(91000.0));

  let agro = &view.agro_census[0];
  assert_eq!(agro.year, 2017);
  assert_eq!(agro.establishments, Some(640));
  assert_eq!(agro.total_area_ha, None);
}

#[tokio::test]
async fn density_joins_latest_census_row() {
  let s = store().await;
  let mut value = cavalcante();
  value["demografia"] = json!({
    "populacao_censo_2010": {"valor": 9392},
    "populacao_censo_2022": {"valor": 9993, "fonte_nome": "IBGE Censo"},
    "densidade_demografica_hab_km2": {"valor": 1.44}
  });

  let ingested = s.ingest_document(doc(value)).await.unwrap();
  assert_eq!(ingested.facts.demography, 2);

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  assert_eq!(view.demography[0].density_km2, None);
  assert_eq!(view.demography[1].year, 2022);
  assert_eq!(view.demography[1].population, Some(9993));
  assert_eq!(view.demography[1].density_km2, Some(1.44));
}

#[tokio::test]
async fn geography_without_any_year_writes_no_row() {
  let s = store().await;
  let mut value = cavalcante();
  value["geografia_territorio"] = json!({
    "area_territorial_km2": {"valor": 6953.65},
    "bioma": {"valor": "Cerrado", "fonte_nome": "IBGE"}
  });

  let ingested = s.ingest_document(doc(value)).await.unwrap();
  assert_eq!(ingested.facts.geography, 0);
  assert_eq!(count(&s, "municipios").await, 1);
  assert_eq!(count(&s, "geografias").await, 0);
  assert_eq!(count(&s, "fontes").await, 0);
}

#[tokio::test]
async fn gdp_without_year_is_skipped_while_hdi_lands() {
  let s = store().await;
  let mut value = cavalcante();
  value["socioeconomia"] = json!({
    "idhm_2010": {"valor": 0.563},
    "pib_per_capita_reais": {"valor": 9800.0},
    "pib_total_mil_reais": {"valor": 91000.0, "fonte_nome": "IBGE"}
  });

  let ingested = s.ingest_document(doc(value)).await.unwrap();
  assert_eq!(ingested.facts.socioeconomics, 1);

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  assert_eq!(view.socioeconomics.len(), 1);
  let row = &view.socioeconomics[0];
  assert_eq!(row.year, 2010);
  assert_eq!(row.hdi, Some(0.563));
  assert_eq!(row.gdp_per_capita, None);
  assert_eq!(row.gdp_total_thousands, None);
  assert_eq!(row.source, None);
}

#[tokio::test]
async fn density_without_year_or_census_writes_nothing() {
  let s = store().await;
  let mut value = cavalcante();
  value["demografia"] = json!({"densidade_demografica_hab_km2": {"valor": 1.44}});

  let ingested = s.ingest_document(doc(value)).await.unwrap();
  assert_eq!(ingested.facts.demography, 0);
  assert_eq!(count(&s, "demografias").await, 0);
}

#[tokio::test]
async fn explicit_reference_years_override_default_years() {
  let s = store().await;
  let mut value = cavalcante();
  value["socioeconomia"] = json!({
    "idhm_2010": {"valor": 0.471, "ano_referencia": 2000},
    "censo_agropecuario_2017": {"numero_estabelecimentos": 512, "ano_referencia": 2006}
  });

  s.ingest_document(doc(value)).await.unwrap();

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  let years: Vec<i64> = view.socioeconomics.iter().map(|r| r.year).collect();
  assert_eq!(years, [2000]);
  assert_eq!(view.socioeconomics[0].hdi, Some(0.471));
  assert_eq!(view.agro_census.len(), 1);
  assert_eq!(view.agro_census[0].year, 2006);
  assert_eq!(view.agro_census[0].establishments, Some(512));
}

#[tokio::test]
async fn land_cover_classes_without_label_are_dropped() {
  let s = store().await;
  let mut value = cavalcante();
  value["cobertura_uso_solo"] = json!({
    "dados_gerais": {"ano_referencia": 2022},
    "classes": [
      {"classe": "Vegetação Nativa", "percentual": 83.4},
      {"area_km2": 12.0, "percentual": 0.2},
      {"classe": "Pastagem", "percentual": 12.9}
    ]
  });

  let ingested = s.ingest_document(doc(value)).await.unwrap();
  assert_eq!(ingested.facts.land_cover_classes, 2);

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  let labels: Vec<&str> = view.land_cover[0].classes.iter().map(|c| c.label.as_str()).collect();
  assert_eq!(labels, ["Vegetação Nativa", "Pastagem"]);
}

#[tokio::test]
async fn integral_floats_count_as_years_and_integers() {
  let s = store().await;
  let mut value = cavalcante();
  value["geografia_territorio"]["area_territorial_km2"]["ano_referencia"] = json!(2022.0);
  value["demografia"] = json!({"populacao_censo_2022": {"valor": 9993.0}});

  let ingested = s.ingest_document(doc(value)).await.unwrap();
  assert_eq!(ingested.facts.geography, 1);

  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  assert_eq!(view.geography[0].year, 2022);
  assert_eq!(view.geography[0].area_km2, Some(6953.65));
  assert_eq!(view.demography[0].population, Some(9993));
}

#[tokio::test]
async fn mistyped_leaves_are_stored_as_null() {
  let s = store().await;
  let mut value = cavalcante();
  value["geografia_territorio"]["bioma"] = json!({"valor": 7, "ano_referencia": 2022});
  value["governanca_planejamento"] = json!({"plano_diretor": {"existe": "sim"}});

  s.ingest_document(doc(value)).await.unwrap();
  let view = s.get_by_slug("cavalcante-go").await.unwrap().unwrap();
  assert_eq!(view.geography[0].biome, None);
  assert_eq!(view.governance.unwrap().has_master_plan, None);
}

// ─── Transactions and cascade ────────────────────────────────────────────────

#[tokio::test]
async fn failure_after_writes_rolls_back_the_document() {
  let s = store().await;
  s.with_connection(|c| {
    c.execute_batch(
      "CREATE TRIGGER reject_boom BEFORE INSERT ON conflitos
       WHEN NEW.tipo = 'boom'
       BEGIN SELECT RAISE(ABORT, 'boom rejected'); END;",
    )
  })
  .await
  .unwrap();

  let mut value = cavalcante();
  value["geografia_territorio"]["bioma"] =
    json!({"valor": "Cerrado", "ano_referencia": 2022, "fonte_nome": "IBGE"});
  value["conflitos_pressoes"] = json!({"boom": {"descricao": "x"}});

  let err = s.ingest_document(doc(value)).await.unwrap_err();
  assert!(err.to_string().contains("boom rejected"), "{err}");

  assert_eq!(count(&s, "municipios").await, 0);
  assert_eq!(count(&s, "geografias").await, 0);
  assert_eq!(count(&s, "fontes").await, 0);
}

#[tokio::test]
async fn deleting_a_municipality_cascades_to_facts() {
  let s = store().await;
  let mut value = cavalcante();
  value["demografia"] = json!({"populacao_censo_2022": {"valor": 9993, "fonte_nome": "IBGE"}});
  value["cobertura_uso_solo"] = json!({
    "dados_gerais": {"ano_referencia": 2022},
    "classes": [{"classe": "Pastagem", "percentual": 12.9}]
  });
  value["governanca_planejamento"] = json!({"plano_diretor": {"existe": true}});
  value["conflitos_pressoes"] = json!({"mineracao": {"descricao": "Garimpo"}});
  s.ingest_document(doc(value)).await.unwrap();

  assert!(s.delete_municipality("5205304").await.unwrap());
  assert!(!s.delete_municipality("5205304").await.unwrap());

  for table in [
    "municipios",
    "geografias",
    "demografias",
    "cobertura_uso_solo_resumo",
    "cobertura_uso_solo_classes",
    "governancas",
    "conflitos",
  ] {
    assert_eq!(count(&s, table).await, 0, "{table}");
  }
  // Orphaned sources are tolerated.
  assert_eq!(count(&s, "fontes").await, 1);
}

// ─── Summaries ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn stored_summary_matches_document_summary() {
  let s = store().await;
  let value = json!({
    "identificacao": {"nome_municipio": "Monte Alegre de Goiás", "uf": "GO", "codigo_ibge": "5213506"},
    "geografia_territorio": {
      "area_territorial_km2": {"valor": 3119.8, "ano_referencia": 2022},
      "bioma": {"valor": "Cerrado"}
    },
    "demografia": {
      "populacao_censo_2010": {"valor": 7730},
      "populacao_censo_2022": {"valor": 6866}
    },
    "socioeconomia": {
      "idhm_2010": {"valor": 0.57},
      "pib_per_capita_reais": {"valor": 14876.98, "ano_referencia": 2021}
    },
    "governanca_planejamento": {"plano_diretor": {"existe": false}}
  });

  s.ingest_document(doc(value.clone())).await.unwrap();

  let stored = s.list_summaries().await.unwrap();
  let mirrored = MunicipalitySummary::from_document(&doc(value)).unwrap();
  assert_eq!(stored, vec![mirrored]);
  assert_eq!(stored[0].slug, "monte-alegre-de-goias-go");
}

#[tokio::test]
async fn census_records_sharing_a_year_keep_the_known_population() {
  let s = store().await;
  let mut value = cavalcante();
  value["demografia"] = json!({
    "populacao_censo_2010": {"valor": 9392, "ano_referencia": 2022},
    "populacao_censo_2022": {"valor": null}
  });

  let ingested = s.ingest_document(doc(value.clone())).await.unwrap();
  assert_eq!(ingested.facts.demography, 1);

  let stored = s.list_summaries().await.unwrap();
  let mirrored = MunicipalitySummary::from_document(&doc(value)).unwrap();
  assert_eq!(stored, vec![mirrored]);
  assert_eq!(stored[0].population, Some(9392));
}

#[tokio::test]
async fn summaries_are_ordered_by_name() {
  let s = store().await;
  for (name, code) in [("Teresina de Goiás", "5221301"), ("Cavalcante", "5205304")] {
    s.ingest_document(doc(json!({
      "identificacao": {"nome_municipio": name, "uf": "GO", "codigo_ibge": code}
    })))
    .await
    .unwrap();
  }

  let names: Vec<String> = s
    .list_summaries()
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.name)
    .collect();
  assert_eq!(names, ["Cavalcante", "Teresina de Goiás"]);
}

// ─── Directory ingestion ─────────────────────────────────────────────────────

fn write(dir: &Path, name: &str, contents: &str) {
  std::fs::write(dir.join(name), contents).unwrap();
}

#[tokio::test]
async fn malformed_file_fails_alone() {
  let s = store().await;
  let dir = tempfile::tempdir().unwrap();

  write(dir.path(), "1-cavalcante.json", &cavalcante().to_string());
  write(
    dir.path(),
    "2-broken.json",
    &json!({
      "identificacao": {"uf": "GO", "codigo_ibge": "5205494"},
      "geografia_territorio": {"area_territorial_km2": {"valor": 393.35, "ano_referencia": 2022}}
    })
    .to_string(),
  );
  write(
    dir.path(),
    "3-teresina.json",
    &json!({
      "identificacao": {"nome_municipio": "Teresina de Goiás", "uf": "GO", "codigo_ibge": "5221301"},
      "geografia_territorio": {"area_territorial_km2": {"valor": 774.64, "ano_referencia": 2022}}
    })
    .to_string(),
  );

  let report = ingest_directory(&s, dir.path()).await.unwrap();
  assert_eq!(
    report.statuses(),
    [FileStatus::Ok, FileStatus::Error, FileStatus::Ok]
  );
  assert_eq!(report.outcomes[1].filename, "2-broken.json");
  assert!(report.outcomes[1].detail.contains("malformed entity"));

  let codes: Vec<String> = s
    .list_municipalities()
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.registry_code)
    .collect();
  assert_eq!(codes, ["5205304", "5221301"]);
  assert_eq!(count(&s, "geografias").await, 2);
}

#[tokio::test]
async fn parse_errors_and_foreign_documents_do_not_stop_the_batch() {
  let s = store().await;
  let dir = tempfile::tempdir().unwrap();

  write(dir.path(), "a-broken.json", "{\"identificacao\": ");
  write(dir.path(), "b-professores.json", r#"[{"nome": "Cybele"}]"#);
  write(dir.path(), "c-gestao.json", r#"{"equipe": []}"#);
  write(dir.path(), "d-cavalcante.JSON", &cavalcante().to_string());
  write(dir.path(), "notes.txt", "not a document");
  std::fs::create_dir(dir.path().join("nested.json")).unwrap();

  let report = ingest_directory(&s, dir.path()).await.unwrap();
  assert_eq!(
    report.statuses(),
    [FileStatus::Error, FileStatus::Skipped, FileStatus::Skipped, FileStatus::Ok]
  );
  assert!(report.outcomes[0].detail.starts_with("parse error"));
  assert_eq!(report.count(FileStatus::Ok), 1);
  assert_eq!(s.list_municipalities().await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_directory_fails_the_call() {
  let s = store().await;
  let dir = tempfile::tempdir().unwrap();
  let result = ingest_directory(&s, &dir.path().join("absent")).await;
  assert!(result.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn symlinked_documents_are_ingested() {
  let s = store().await;
  let outside = tempfile::tempdir().unwrap();
  let dir = tempfile::tempdir().unwrap();

  write(outside.path(), "cavalcante.json", &cavalcante().to_string());
  std::os::unix::fs::symlink(
    outside.path().join("cavalcante.json"),
    dir.path().join("a-cavalcante.json"),
  )
  .unwrap();
  std::os::unix::fs::symlink(
    outside.path().join("absent.json"),
    dir.path().join("b-dangling.json"),
  )
  .unwrap();

  let report = ingest_directory(&s, dir.path()).await.unwrap();
  assert_eq!(report.statuses(), [FileStatus::Ok, FileStatus::Error]);
  assert!(report.outcomes[1].detail.starts_with("read error"));
  assert_eq!(s.list_municipalities().await.unwrap().len(), 1);
}
