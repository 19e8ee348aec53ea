//! SQL schema for the hrdesk SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,   -- 'users' | 'kra_templates' | 'kpi_records' | 'payroll'
    doc_id      TEXT NOT NULL,
    data        TEXT NOT NULL,   -- JSON object body, without the id
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC
    updated_at  TEXT NOT NULL,   -- RFC 3339 UTC
    PRIMARY KEY (collection, doc_id)
);

CREATE INDEX IF NOT EXISTS documents_updated_idx ON documents(collection, updated_at);

PRAGMA user_version = 1;
";
