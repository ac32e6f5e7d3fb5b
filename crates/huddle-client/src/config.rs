//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so a session can start with zero
//! configuration for local development.

use std::path::PathBuf;

use huddle_shared::constants::{DEFAULT_FEED_CAPACITY, MAX_MESSAGE_LEN};
use huddle_store::{Database, Store, StoreError};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// SQLite database file.
    /// Env: `HUDDLE_DB_PATH`
    /// Default: `None`, meaning `huddle.db` in the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Longest accepted message, in bytes.
    /// Env: `HUDDLE_MAX_MESSAGE_LEN`
    /// Default: `4096`
    pub max_message_len: usize,

    /// Change notifications buffered per live subscription before it has
    /// to resynchronize.
    /// Env: `HUDDLE_FEED_CAPACITY`
    /// Default: `64`
    pub feed_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_message_len: MAX_MESSAGE_LEN,
            feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("HUDDLE_DB_PATH") {
            if !path.trim().is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("HUDDLE_MAX_MESSAGE_LEN") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_message_len = n,
                _ => tracing::warn!(value = %val, "Invalid HUDDLE_MAX_MESSAGE_LEN, using default"),
            }
        }

        if let Some(val) = lookup("HUDDLE_FEED_CAPACITY") {
            match val.trim().parse::<usize>() {
                Ok(n) => config.feed_capacity = n.max(1),
                Err(_) => tracing::warn!(value = %val, "Invalid HUDDLE_FEED_CAPACITY, using default"),
            }
        }

        config
    }

    /// Open (creating and migrating if needed) the configured database.
    pub fn open_store(&self) -> Result<Store, StoreError> {
        let db = match &self.database_path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Database::open_at(path, self.feed_capacity)?
            }
            None => Database::new(self.feed_capacity)?,
        };
        Ok(Store::new(db))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.max_message_len, 4096);
        assert_eq!(config.feed_capacity, 64);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("HUDDLE_DB_PATH", "/tmp/huddle-test.db"),
            ("HUDDLE_MAX_MESSAGE_LEN", "280"),
            ("HUDDLE_FEED_CAPACITY", "0"),
        ]));
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/huddle-test.db")));
        assert_eq!(config.max_message_len, 280);
        assert_eq!(config.feed_capacity, 1);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("HUDDLE_MAX_MESSAGE_LEN", "lots"),
            ("HUDDLE_FEED_CAPACITY", "-3"),
        ]));
        assert_eq!(config.max_message_len, MAX_MESSAGE_LEN);
        assert_eq!(config.feed_capacity, DEFAULT_FEED_CAPACITY);
    }

    #[test]
    fn test_open_store_at_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            database_path: Some(dir.path().join("nested").join("huddle.db")),
            ..ClientConfig::default()
        };
        let store = config.open_store().unwrap();
        let users = store.with(|db| db.list_users()).unwrap();
        assert!(users.is_empty());
    }
}
