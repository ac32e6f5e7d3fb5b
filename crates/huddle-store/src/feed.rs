//! Change notifications for live subscribers.
//!
//! Every successful [`Database::append_message`] publishes one
//! [`ThreadChange`] on a `tokio::sync::broadcast` channel. Listeners receive
//! the id of the thread that changed and re-read it; the notification carries
//! no message content.
//!
//! [`Database::append_message`]: crate::Database::append_message

use huddle_shared::{ThreadId, Uid};

/// "Something was appended to this thread."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadChange {
    pub workspace: Uid,
    pub thread_id: ThreadId,
}
