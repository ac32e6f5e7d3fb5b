//! Serializable payloads for a UI layer.
//!
//! Field names are camelCase so the JSON can be handed to a web front end
//! as-is.

use std::sync::Arc;

use huddle_store::Message;
use serde::Serialize;

use crate::gate::{Identity, Role};
use crate::session::MessageSink;
use crate::stream::Snapshot;

pub const EVENT_THREAD_SNAPSHOT: &str = "thread-snapshot";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub thread_id: String,
    pub from_email: String,
    pub to_email: String,
    pub text: String,
    pub timestamp: String,
}

impl From<&Message> for MessageDto {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.to_string(),
            thread_id: m.thread_id.to_string(),
            from_email: m.from_email.to_string(),
            to_email: m.to_email.to_string(),
            text: m.text.clone(),
            timestamp: m.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    pub thread_id: String,
    pub messages: Vec<MessageDto>,
}

impl From<&Snapshot> for SnapshotPayload {
    fn from(s: &Snapshot) -> Self {
        Self {
            thread_id: s.thread_id.to_string(),
            messages: s.messages.iter().map(MessageDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDto {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub workspace: String,
}

impl From<&Identity> for IdentityDto {
    fn from(i: &Identity) -> Self {
        Self {
            uid: i.uid.to_string(),
            email: i.email.to_string(),
            role: i.role,
            workspace: i.workspace.to_string(),
        }
    }
}

/// Adapt an event emitter (`name`, JSON payload) into a session sink.
pub fn json_sink<F>(emit: F) -> MessageSink
where
    F: Fn(&str, serde_json::Value) + Send + Sync + 'static,
{
    Arc::new(move |snapshot: Snapshot| {
        match serde_json::to_value(SnapshotPayload::from(&snapshot)) {
            Ok(payload) => emit(EVENT_THREAD_SNAPSHOT, payload),
            Err(e) => {
                tracing::error!(event = EVENT_THREAD_SNAPSHOT, error = %e, "Failed to serialize event")
            }
        }
    })
}
