//! Live message feeds and outgoing messages.
//!
//! A [`Subscription`] is a spawned task that re-reads its thread whenever
//! the store announces an append to it, and hands the full ordered message
//! list to a callback. Deliveries are snapshots, never diffs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use huddle_shared::constants::MAX_MESSAGE_LEN;
use huddle_shared::{Email, ThreadId, ValidationError};
use huddle_store::{Message, NewMessage, StoreError};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::backend::ChatStore;
use crate::error::SessionError;

/// Every message of one thread, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub thread_id: ThreadId,
    pub messages: Vec<Message>,
}

/// Handle to a live feed. Dropping it cancels the feed.
#[derive(Debug)]
pub struct Subscription {
    thread_id: ThreadId,
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
    errors: mpsc::UnboundedReceiver<StoreError>,
}

impl Subscription {
    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop further deliveries. Safe to call repeatedly.
    ///
    /// A snapshot the runtime already handed to the callback may still be
    /// in flight; consumers should compare its `thread_id` with the thread
    /// they expect.
    pub fn cancel(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            debug!(thread = %self.thread_id, "subscription cancelled");
        }
        self.task.abort();
    }

    /// Next store error reported by the feed, if any is pending.
    pub fn try_next_error(&mut self) -> Option<StoreError> {
        self.errors.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Publishes and follows messages through a [`ChatStore`].
#[derive(Clone)]
pub struct MessageStream<C> {
    store: C,
    max_message_len: usize,
}

impl<C> MessageStream<C>
where
    C: ChatStore + Clone + 'static,
{
    pub fn new(store: C) -> Self {
        Self {
            store,
            max_message_len: MAX_MESSAGE_LEN,
        }
    }

    pub fn with_max_message_len(mut self, max: usize) -> Self {
        self.max_message_len = max;
        self
    }

    /// Follow `thread_id`, calling `on_messages` with the initial contents
    /// and again after every append.
    ///
    /// Must be called from within a Tokio runtime. Store errors while
    /// following are logged and queued on the subscription's error channel;
    /// the feed keeps running.
    pub fn subscribe<F>(&self, thread_id: ThreadId, on_messages: F) -> Result<Subscription, StoreError>
    where
        F: FnMut(Snapshot) + Send + 'static,
    {
        // Listen before the initial read so no append falls in between.
        let mut changes = self.store.watch()?;

        let store = self.store.clone();
        let active = Arc::new(AtomicBool::new(true));
        let (err_tx, err_rx) = mpsc::unbounded_channel();

        let flag = Arc::clone(&active);
        let tid = thread_id.clone();
        let mut on_messages = on_messages;

        let task = tokio::spawn(async move {
            debug!(thread = %tid, "subscription started");
            let mut pending = true;

            loop {
                if pending {
                    pending = false;
                    match store.list_messages(&tid).await {
                        Ok(messages) => {
                            if !flag.load(Ordering::SeqCst) {
                                break;
                            }
                            on_messages(Snapshot {
                                thread_id: tid.clone(),
                                messages,
                            });
                        }
                        Err(e) => {
                            error!(thread = %tid, error = %e, "failed to load messages");
                            let _ = err_tx.send(e);
                        }
                    }
                }

                match changes.recv().await {
                    Ok(change) => pending = change.thread_id == tid,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(thread = %tid, skipped, "change feed lagged, reloading");
                        pending = true;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription {
            thread_id,
            active,
            task,
            errors: err_rx,
        })
    }

    /// Append `text` to the thread. Blank text is rejected without touching
    /// the store.
    pub async fn send(
        &self,
        thread_id: &ThreadId,
        from_email: &Email,
        to_email: &Email,
        text: &str,
    ) -> Result<Message, SessionError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        if text.len() > self.max_message_len {
            return Err(ValidationError::MessageTooLong {
                len: text.len(),
                max: self.max_message_len,
            }
            .into());
        }

        let message = NewMessage {
            from_email: from_email.clone(),
            to_email: to_email.clone(),
            text: text.to_string(),
        };
        let stored = self.store.append_message(thread_id, &message).await?;
        debug!(thread = %thread_id, id = %stored.id, "message sent");
        Ok(stored)
    }
}
