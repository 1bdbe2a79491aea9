//! SQL schema for the FaltaQuanto SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- trimmed, lower-cased
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Only the SHA-256 digest of a bearer token is ever stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash  TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id         TEXT PRIMARY KEY,
    owner_id           TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    name               TEXT NOT NULL,
    weekdays           INTEGER NOT NULL,  -- bit n set = scheduled on weekday n (0 = Sunday)
    absence_limit      INTEGER NOT NULL,
    absences_committed INTEGER NOT NULL DEFAULT 0,
    classes_attended   INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL,
    CHECK (weekdays BETWEEN 1 AND 127),
    CHECK (absence_limit >= 0),
    CHECK (absences_committed >= 0),
    CHECK (classes_attended >= 0)
);

-- Always written together with subjects.absences_committed, in one transaction.
CREATE TABLE IF NOT EXISTS absences (
    absence_id  TEXT PRIMARY KEY,
    subject_id  TEXT NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS sessions_user_idx    ON sessions(user_id);
CREATE INDEX IF NOT EXISTS subjects_owner_idx   ON subjects(owner_id);
CREATE INDEX IF NOT EXISTS absences_subject_idx ON absences(subject_id);

PRAGMA user_version = 1;
";
