//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! to a UI layer unchanged.

use chrono::{DateTime, Utc};
use huddle_shared::{Email, ThreadId, Uid};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered identity plus its workspace metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Primary key, assigned by the authentication provider.
    pub uid: Uid,
    pub email: Email,
    /// The invite list. Only meaningful for owners.
    pub contacts: Vec<Email>,
    /// Set once, when the workspace is created.
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Thread
// ---------------------------------------------------------------------------

/// A conversation between exactly two participants inside one workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thread {
    pub id: ThreadId,
    /// The owner's uid.
    pub workspace: Uid,
    /// Stored in the order given at creation; matching ignores the order.
    pub participants: [Email; 2],
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat entry. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub thread_id: ThreadId,
    pub from_email: Email,
    pub to_email: Email,
    pub text: String,
    /// Assigned by the store; never earlier than the previous message in
    /// the same thread.
    pub timestamp: DateTime<Utc>,
}

/// The caller-supplied part of a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from_email: Email,
    pub to_email: Email,
    pub text: String,
}
