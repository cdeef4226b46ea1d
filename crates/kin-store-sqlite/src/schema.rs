//! SQL schema for the Kin SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Record bodies are JSON. Only the columns needed for lookups are broken out.
CREATE TABLE IF NOT EXISTS persons (
    person_id  TEXT PRIMARY KEY,
    body_json  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS families (
    family_id  TEXT PRIMARY KEY,
    father_id  TEXT,             -- NULL when the slot is empty
    mother_id  TEXT,
    body_json  TEXT NOT NULL
);

-- One row per committed merge.
CREATE TABLE IF NOT EXISTS merge_journal (
    entry_id     TEXT PRIMARY KEY,
    description  TEXT NOT NULL,
    recorded_at  TEXT NOT NULL   -- ISO 8601 UTC
);

CREATE INDEX IF NOT EXISTS families_parents_idx ON families(father_id, mother_id);
CREATE INDEX IF NOT EXISTS journal_recorded_idx ON merge_journal(recorded_at);

PRAGMA user_version = 1;
";
