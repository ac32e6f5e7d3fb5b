//! v001 -- Initial schema creation.
//!
//! Creates `users`, `contacts`, `threads` and `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (one row per registered identity; owners own a workspace)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    uid        TEXT PRIMARY KEY NOT NULL,     -- opaque, from the auth provider
    email      TEXT NOT NULL,                 -- normalized
    is_owner   INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    created_at TEXT NOT NULL                  -- RFC-3339, microseconds, UTC
);

-- ----------------------------------------------------------------
-- Contacts (an owner's invite list)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS contacts (
    owner_uid TEXT NOT NULL,                  -- FK -> users(uid)
    email     TEXT NOT NULL,                  -- normalized
    added_at  TEXT NOT NULL,

    PRIMARY KEY (owner_uid, email),
    FOREIGN KEY (owner_uid) REFERENCES users(uid) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Threads (two participants, scoped to the owner's workspace)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS threads (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID, derived from the pair
    workspace_uid TEXT NOT NULL,              -- FK -> users(uid)
    participant_a TEXT NOT NULL,
    participant_b TEXT NOT NULL,
    created_at    TEXT NOT NULL,

    FOREIGN KEY (workspace_uid) REFERENCES users(uid) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_threads_pair
    ON threads(workspace_uid, participant_a, participant_b);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT, -- insertion order, breaks ties
    id         TEXT NOT NULL UNIQUE,              -- UUID v4
    thread_id  TEXT NOT NULL,                     -- FK -> threads(id)
    from_email TEXT NOT NULL,
    to_email   TEXT NOT NULL,
    text       TEXT NOT NULL,
    timestamp  TEXT NOT NULL,                     -- non-decreasing per thread

    FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_thread_ts
    ON messages(thread_id, timestamp ASC, seq ASC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
