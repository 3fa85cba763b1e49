//! SQL schema for the Docket SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL CHECK (role IN ('admin', 'editor', 'viewer')),
    verified      INTEGER NOT NULL DEFAULT 0
);

-- One pending or consumed code per email. Only the SHA-256 of the code is kept.
CREATE TABLE IF NOT EXISTS otp_verification (
    email      TEXT PRIMARY KEY COLLATE NOCASE,
    otp_hash   TEXT NOT NULL,
    verified   INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    expires_at TEXT NOT NULL              -- RFC 3339 UTC, fixed width
);

CREATE TABLE IF NOT EXISTS documents (
    document_id  TEXT PRIMARY KEY,        -- hyphenated UUID
    title        TEXT NOT NULL,
    filename     TEXT NOT NULL,           -- as uploaded, offered on download
    file_path    TEXT NOT NULL,           -- relative to the blob root
    uploaded_by  INTEGER NOT NULL REFERENCES users(id),
    last_updated TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    tag_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    tag_name TEXT NOT NULL UNIQUE         -- case-sensitive
);

CREATE TABLE IF NOT EXISTS document_tags (
    document_id TEXT NOT NULL REFERENCES documents(document_id) ON DELETE CASCADE,
    tag_id      INTEGER NOT NULL REFERENCES tags(tag_id),
    PRIMARY KEY (document_id, tag_id)
);

CREATE TABLE IF NOT EXISTS permissions (
    document_id TEXT NOT NULL REFERENCES documents(document_id) ON DELETE CASCADE,
    user_email  TEXT NOT NULL,
    PRIMARY KEY (document_id, user_email)
);

-- Comments and activity logs reference documents softly: they outlive the
-- document they describe.
CREATE TABLE IF NOT EXISTS comments (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id  TEXT NOT NULL,
    user_email   TEXT NOT NULL,
    comment_text TEXT NOT NULL,
    timestamp    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activity_logs (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL,
    action      TEXT NOT NULL,
    document_id TEXT,
    timestamp   TEXT NOT NULL             -- YYYY-MM-DD HH:MM:SS
);

CREATE INDEX IF NOT EXISTS documents_uploader_idx ON documents(uploaded_by);
CREATE INDEX IF NOT EXISTS document_tags_tag_idx  ON document_tags(tag_id);
CREATE INDEX IF NOT EXISTS comments_document_idx  ON comments(document_id);
CREATE INDEX IF NOT EXISTS activity_user_idx      ON activity_logs(user_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx      ON sessions(user_id);

PRAGMA user_version = 1;
";
