//! Domain primitives shared by the Huddle store and client crates.
//!
//! Nothing in here performs I/O: identifiers, email normalization and the
//! validation error taxonomy.

pub mod constants;
pub mod error;
pub mod types;

pub use error::ValidationError;
pub use types::{normalize_email, Email, ThreadId, Uid};
