/// Application name
pub const APP_NAME: &str = "Huddle";

/// File name of the SQLite database inside the data directory
pub const DB_FILE_NAME: &str = "huddle.db";

/// Maximum chat message length in bytes
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Number of change notifications buffered per live subscriber
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// Key derivation context for pair-derived thread identifiers (BLAKE3)
pub const KDF_CONTEXT_THREAD_ID: &str = "huddle-thread-id-v1";
