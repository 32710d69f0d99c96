//! SQL schema for the riskdoc SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per document reference. Re-saving a reference updates it in place.
CREATE TABLE IF NOT EXISTS documents (
    document_id       TEXT PRIMARY KEY,
    reference         TEXT NOT NULL UNIQUE,  -- '{system}-{item}-{sequence}'
    schema_id         TEXT NOT NULL,         -- e.g. '1200-industrial'
    status            TEXT NOT NULL,         -- 'temporary' | 'submitted'
    document_number   TEXT UNIQUE,           -- set at first submit
    date              TEXT NOT NULL,         -- YYYY-MM-DD
    approval_deadline TEXT NOT NULL,         -- YYYY-MM-DD
    body_json         TEXT NOT NULL,         -- schema data payload
    signatures_json   TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS members (
    member_id  TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    department TEXT NOT NULL,
    role       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Declaration order matters: the first enabled match wins.
CREATE TABLE IF NOT EXISTS risk_ranges (
    position INTEGER PRIMARY KEY,
    min      REAL NOT NULL,
    max      REAL NOT NULL,
    label    TEXT NOT NULL,
    enabled  INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS documents_schema_idx  ON documents(schema_id);
CREATE INDEX IF NOT EXISTS documents_updated_idx ON documents(updated_at);
CREATE INDEX IF NOT EXISTS members_name_idx      ON members(name);

PRAGMA user_version = 1;
";
