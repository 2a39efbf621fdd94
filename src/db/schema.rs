//! Database schema and migrations for Academia.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded; the schema_version table tracks which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table for authentication and role management
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL,
    password    TEXT NOT NULL,                    -- Argon2id hash
    role        TEXT NOT NULL DEFAULT 'student',  -- 'student', 'faculty', 'admin'
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX idx_users_username_nocase ON users(username COLLATE NOCASE);
CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: Resources table; each row owns exactly one stored object
    r#"
CREATE TABLE resources (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    title         TEXT NOT NULL,
    year          INTEGER NOT NULL,
    subject_code  TEXT NOT NULL,
    exam_type     TEXT NOT NULL,
    file_url      TEXT NOT NULL,   -- Fully-qualified retrieval URL
    storage_id    TEXT,            -- Object store identifier (NULL only for legacy rows)
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_resources_created_at ON resources(created_at);
CREATE INDEX idx_resources_subject_code ON resources(subject_code);
"#,
];
