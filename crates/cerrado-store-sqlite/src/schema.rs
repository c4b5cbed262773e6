//! SQL schema for the Cerrado SQLite store.
//!
//! Executed once at connection startup. Natural-key uniqueness for every
//! fact domain is enforced here as well as by the upsert statements.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Attribution records; deduplicated by (nome, url) lookup before insert.
CREATE TABLE IF NOT EXISTS fontes (
    id          INTEGER PRIMARY KEY,
    nome        TEXT NOT NULL,
    url         TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS municipios (
    id           INTEGER PRIMARY KEY,
    slug         TEXT NOT NULL UNIQUE,
    nome         TEXT NOT NULL,
    uf           TEXT NOT NULL,
    codigo_ibge  TEXT NOT NULL UNIQUE,
    observacoes  TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS geografias (
    id              INTEGER PRIMARY KEY,
    municipio_id    INTEGER NOT NULL REFERENCES municipios(id) ON DELETE CASCADE,
    ano_referencia  INTEGER NOT NULL,
    area_km2        REAL,
    bioma           TEXT,
    fonte_id        INTEGER REFERENCES fontes(id),
    UNIQUE (municipio_id, ano_referencia)
);

CREATE TABLE IF NOT EXISTS demografias (
    id                 INTEGER PRIMARY KEY,
    municipio_id       INTEGER NOT NULL REFERENCES municipios(id) ON DELETE CASCADE,
    ano                INTEGER NOT NULL,
    populacao          INTEGER,
    densidade_hab_km2  REAL,
    fonte_id           INTEGER REFERENCES fontes(id),
    UNIQUE (municipio_id, ano)
);

CREATE TABLE IF NOT EXISTS socioeconomias (
    id                    INTEGER PRIMARY KEY,
    municipio_id          INTEGER NOT NULL REFERENCES municipios(id) ON DELETE CASCADE,
    ano                   INTEGER NOT NULL,
    idhm                  REAL,
    pib_total_mil_reais   REAL,
    pib_per_capita_reais  REAL,
    fonte_id              INTEGER REFERENCES fontes(id),
    UNIQUE (municipio_id, ano)
);

CREATE TABLE IF NOT EXISTS agro_censo (
    id                              INTEGER PRIMARY KEY,
    municipio_id                    INTEGER NOT NULL REFERENCES municipios(id) ON DELETE CASCADE,
    ano                             INTEGER NOT NULL,
    numero_estabelecimentos         INTEGER,
    area_total_estabelecimentos_ha  REAL,
    pessoal_ocupado                 INTEGER,
    area_lavouras_ha                REAL,
    area_pastagens_ha               REAL,
    fonte_id                        INTEGER REFERENCES fontes(id),
    UNIQUE (municipio_id, ano)
);

CREATE TABLE IF NOT EXISTS cobertura_uso_solo_resumo (
    id              INTEGER PRIMARY KEY,
    municipio_id    INTEGER NOT NULL REFERENCES municipios(id) ON DELETE CASCADE,
    ano_referencia  INTEGER NOT NULL,
    fonte_id        INTEGER REFERENCES fontes(id),
    UNIQUE (municipio_id, ano_referencia)
);

-- Children are always replaced together with their summary row.
CREATE TABLE IF NOT EXISTS cobertura_uso_solo_classes (
    id            INTEGER PRIMARY KEY,
    cobertura_id  INTEGER NOT NULL REFERENCES cobertura_uso_solo_resumo(id) ON DELETE CASCADE,
    classe        TEXT NOT NULL,
    area_km2      REAL,
    percentual    REAL
);

CREATE TABLE IF NOT EXISTS governancas (
    id                    INTEGER PRIMARY KEY,
    municipio_id          INTEGER NOT NULL UNIQUE REFERENCES municipios(id) ON DELETE CASCADE,
    possui_plano_diretor  INTEGER,
    lei_referencia        TEXT,
    observacao            TEXT,
    fonte_id              INTEGER REFERENCES fontes(id)
);

-- Append-only; several rows of the same tipo are legal.
CREATE TABLE IF NOT EXISTS conflitos (
    id            INTEGER PRIMARY KEY,
    municipio_id  INTEGER NOT NULL REFERENCES municipios(id) ON DELETE CASCADE,
    tipo          TEXT NOT NULL,
    descricao     TEXT,
    fonte_id      INTEGER REFERENCES fontes(id)
);

CREATE INDEX IF NOT EXISTS fontes_nome_idx       ON fontes(nome);
CREATE INDEX IF NOT EXISTS classes_cobertura_idx ON cobertura_uso_solo_classes(cobertura_id);
CREATE INDEX IF NOT EXISTS conflitos_municipio_idx ON conflitos(municipio_id);

PRAGMA user_version = 1;
";
