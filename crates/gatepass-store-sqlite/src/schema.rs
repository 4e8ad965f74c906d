//! SQL schema for the Gatepass SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    email         TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    role          TEXT NOT NULL,   -- 'STUDENT' | 'ADMIN' | 'WARDEN' | 'WATCHMAN' | 'SUPER'
    gender        TEXT,            -- 'MALE' | 'FEMALE' | NULL
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Only the SHA-256 of a session token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id    INTEGER NOT NULL REFERENCES users(user_id),
    submit        INTEGER NOT NULL DEFAULT 0,
    returned      INTEGER NOT NULL DEFAULT 0,
    comeout_time  TEXT,            -- RFC 3339 UTC; never cleared once set
    comein_time   TEXT,            -- RFC 3339 UTC; set together with returned
    photo         TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL,
    CHECK (returned = 0 OR comein_time IS NOT NULL),
    CHECK (submit = 1 OR (returned = 0 AND comeout_time IS NULL))
);

CREATE INDEX IF NOT EXISTS submissions_student_idx ON submissions(student_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx       ON sessions(user_id);

PRAGMA user_version = 1;
";
