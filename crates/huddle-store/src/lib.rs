//! # huddle-store
//!
//! SQLite-backed storage for Huddle workspaces: registered users and their
//! invite lists, two-party threads, and the messages inside them.
//!
//! The crate exposes a synchronous [`Database`] handle wrapping a
//! `rusqlite::Connection`, a cloneable [`Store`] that shares one database
//! between tasks, and a broadcast change feed that live subscribers listen
//! to.

pub mod contacts;
pub mod database;
pub mod feed;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod threads;
pub mod users;

mod error;
mod rows;

pub use database::{Database, Store};
pub use error::StoreError;
pub use feed::ThreadChange;
pub use models::*;
