//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. [`Store`] shares one
//! `Database` between every session and subscription task of a process.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use directories::ProjectDirs;
use huddle_shared::constants::{DB_FILE_NAME, DEFAULT_FEED_CAPACITY};
use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::error::{Result, StoreError};
use crate::feed::ThreadChange;
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`] plus the change feed that
/// writes to the message log are published on.
pub struct Database {
    conn: Connection,
    changes: broadcast::Sender<ThreadChange>,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/huddle/huddle.db`
    /// - macOS:   `~/Library/Application Support/dev.huddle.huddle/huddle.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\huddle\huddle\data\huddle.db`
    pub fn new(feed_capacity: usize) -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("dev", "huddle", "huddle").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join(DB_FILE_NAME);

        Self::open_at(&db_path, feed_capacity)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path, feed_capacity: usize) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn, feed_capacity)
    }

    /// Open a private, in-memory database. Nothing survives the handle.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, DEFAULT_FEED_CAPACITY)
    }

    fn from_connection(conn: Connection, feed_capacity: usize) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;

        // broadcast::channel panics on a zero capacity.
        let (changes, _) = broadcast::channel(feed_capacity.max(1));

        Ok(Self { conn, changes })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Register a new listener on the change feed.
    ///
    /// Only changes published after this call are observed.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ThreadChange> {
        self.changes.subscribe()
    }

    pub(crate) fn publish_change(&self, change: ThreadChange) {
        // No listeners is not an error.
        let listeners = self.changes.send(change).unwrap_or(0);
        tracing::trace!(listeners, "published thread change");
    }
}

/// Cloneable, thread-safe handle to a shared [`Database`].
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<Database>>,
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(Mutex::new(db)),
        }
    }

    /// Shortcut for a fresh in-memory store.
    pub fn in_memory() -> Result<Self> {
        Database::open_in_memory().map(Self::new)
    }

    /// Lock the database for the duration of the returned guard.
    ///
    /// Never hold the guard across an `.await`.
    pub fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Run `f` with the database locked.
    pub fn with<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let db = self.lock()?;
        f(&db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path, 8).expect("should open");
        assert!(db.path().is_some());

        drop(db);
        // Migrations are idempotent on reopen.
        Database::open_at(&path, 8).expect("should reopen");
    }

    #[test]
    fn test_zero_feed_capacity_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("zero.db"), 0).expect("should open");
        let _rx = db.subscribe_changes();
    }

    #[test]
    fn test_store_clones_share_one_database() {
        let store = Store::in_memory().unwrap();
        let other = store.clone();
        store
            .with(|db| {
                db.conn()
                    .execute_batch("CREATE TABLE probe (x INTEGER); INSERT INTO probe VALUES (7);")?;
                Ok(())
            })
            .unwrap();
        let x: i64 = other
            .with(|db| Ok(db.conn().query_row("SELECT x FROM probe", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(x, 7);
    }
}
