//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Per-scope counters table schema.
#[derive(Iden)]
pub enum Counters {
    Table,
    #[iden = "scope_key"]
    ScopeKey,
    #[iden = "last_issued"]
    LastIssued,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Documents table schema.
#[derive(Iden)]
pub enum Documents {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "subject"]
    Subject,
    #[iden = "status"]
    Status,
    #[iden = "scope_key"]
    ScopeKey,
    #[iden = "sequence_number"]
    SequenceNumber,
    #[iden = "finalized_at"]
    FinalizedAt,
    #[iden = "created_at"]
    CreatedAt,
}

/// SQLite schema, one statement per entry.
#[cfg(feature = "sqlite")]
pub const SQLITE_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS counters (
    scope_key TEXT NOT NULL PRIMARY KEY,
    last_issued INTEGER NOT NULL CHECK (last_issued >= 0),
    updated_at TEXT NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT NOT NULL PRIMARY KEY,
    subject TEXT NOT NULL,
    status TEXT NOT NULL,
    scope_key TEXT,
    sequence_number INTEGER,
    finalized_at TEXT,
    created_at TEXT NOT NULL,
    CHECK ((status = 'draft') = (sequence_number IS NULL)),
    CHECK ((scope_key IS NULL) = (sequence_number IS NULL)),
    CHECK ((finalized_at IS NULL) = (sequence_number IS NULL))
)"#,
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_scope_sequence
    ON documents(scope_key, sequence_number)"#,
];

/// PostgreSQL schema, one statement per entry.
#[cfg(feature = "postgres")]
pub const POSTGRES_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS counters (
    scope_key TEXT NOT NULL PRIMARY KEY,
    last_issued BIGINT NOT NULL CHECK (last_issued >= 0),
    updated_at TEXT NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT NOT NULL PRIMARY KEY,
    subject TEXT NOT NULL,
    status TEXT NOT NULL,
    scope_key TEXT,
    sequence_number BIGINT,
    finalized_at TEXT,
    created_at TEXT NOT NULL,
    CHECK ((status = 'draft') = (sequence_number IS NULL)),
    CHECK ((scope_key IS NULL) = (sequence_number IS NULL)),
    CHECK ((finalized_at IS NULL) = (sequence_number IS NULL))
)"#,
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_scope_sequence
    ON documents(scope_key, sequence_number)"#,
];
