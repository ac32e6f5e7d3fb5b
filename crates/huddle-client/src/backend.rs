//! The store operations the core consumes.
//!
//! The invitation gate only needs [`IdentityStore`]; the thread resolver and
//! message stream only need [`ChatStore`]. Both are implemented for the
//! SQLite-backed [`huddle_store::Store`]; tests wrap that store to observe or
//! break individual calls.

use std::future::Future;

use huddle_shared::{Email, ThreadId, Uid};
use huddle_store::{Message, NewMessage, Store, StoreError, Thread, ThreadChange, User};
use tokio::sync::broadcast;

pub trait IdentityStore: Send + Sync {
    fn get_user(&self, uid: &Uid) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    fn create_user(&self, user: &User) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every registered user, with contacts, in registration order.
    fn list_users(&self) -> impl Future<Output = Result<Vec<User>, StoreError>> + Send;
}

pub trait ChatStore: Send + Sync {
    /// Order-insensitive lookup, at most one result.
    fn find_thread(
        &self,
        workspace: &Uid,
        a: &Email,
        b: &Email,
    ) -> impl Future<Output = Result<Option<Thread>, StoreError>> + Send;

    /// Store `thread` unless its id is taken, and return whichever thread
    /// holds the id afterwards.
    fn create_thread(&self, thread: &Thread)
        -> impl Future<Output = Result<Thread, StoreError>> + Send;

    fn append_message(
        &self,
        thread_id: &ThreadId,
        message: &NewMessage,
    ) -> impl Future<Output = Result<Message, StoreError>> + Send;

    /// Oldest first.
    fn list_messages(
        &self,
        thread_id: &ThreadId,
    ) -> impl Future<Output = Result<Vec<Message>, StoreError>> + Send;

    /// Listen for appends to any thread.
    fn watch(&self) -> Result<broadcast::Receiver<ThreadChange>, StoreError>;
}

impl IdentityStore for Store {
    async fn get_user(&self, uid: &Uid) -> Result<Option<User>, StoreError> {
        self.with(|db| db.get_user(uid))
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.with(|db| db.create_user(user))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.with(|db| db.list_users())
    }
}

impl ChatStore for Store {
    async fn find_thread(
        &self,
        workspace: &Uid,
        a: &Email,
        b: &Email,
    ) -> Result<Option<Thread>, StoreError> {
        self.with(|db| db.find_thread(workspace, a, b))
    }

    async fn create_thread(&self, thread: &Thread) -> Result<Thread, StoreError> {
        self.with(|db| {
            if db.insert_thread_if_absent(thread)? {
                Ok(thread.clone())
            } else {
                db.get_thread(&thread.id)
            }
        })
    }

    async fn append_message(
        &self,
        thread_id: &ThreadId,
        message: &NewMessage,
    ) -> Result<Message, StoreError> {
        self.with(|db| db.append_message(thread_id, message))
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>, StoreError> {
        self.with(|db| db.list_messages(thread_id))
    }

    fn watch(&self) -> Result<broadcast::Receiver<ThreadChange>, StoreError> {
        self.with(|db| Ok(db.subscribe_changes()))
    }
}
