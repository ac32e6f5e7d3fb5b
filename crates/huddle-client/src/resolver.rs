//! Maps an unordered pair of participants to their one thread.

use chrono::Utc;
use huddle_shared::{Email, ThreadId, Uid, ValidationError};
use huddle_store::Thread;
use tracing::{debug, info};

use crate::backend::ChatStore;
use crate::error::SessionError;

/// Return the id of the thread between `a` and `b` in `workspace`,
/// creating it on first use.
///
/// New threads get an id derived from the workspace and the sorted pair, so
/// two racing callers that both miss the lookup still converge on a single
/// row: the slower insert is ignored and both return the same id.
pub async fn find_or_create_thread<C: ChatStore>(
    store: &C,
    workspace: &Uid,
    a: &Email,
    b: &Email,
) -> Result<ThreadId, SessionError> {
    if a == b {
        return Err(ValidationError::SameParticipants.into());
    }

    if let Some(existing) = store.find_thread(workspace, a, b).await? {
        debug!(thread = %existing.id, "reusing thread");
        return Ok(existing.id);
    }

    let candidate = Thread {
        id: ThreadId::for_pair(workspace, a, b),
        workspace: workspace.clone(),
        participants: [a.clone(), b.clone()],
        created_at: Utc::now(),
    };
    let stored = store.create_thread(&candidate).await?;

    info!(thread = %stored.id, workspace = %workspace, "thread created");
    Ok(stored.id)
}

#[cfg(test)]
mod tests {
    use huddle_store::{Store, User};

    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn workspace_store() -> (Store, Uid) {
        let store = Store::in_memory().unwrap();
        let ws = Uid::new("owner-uid");
        store
            .with(|db| {
                db.create_user(&User {
                    uid: ws.clone(),
                    email: email("owner@x.com"),
                    contacts: vec![email("agent@x.com")],
                    is_owner: true,
                    created_at: Utc::now(),
                })
            })
            .unwrap();
        (store, ws)
    }

    fn thread_count(store: &Store) -> i64 {
        store
            .with(|db| {
                Ok(db
                    .conn()
                    .query_row("SELECT COUNT(*) FROM threads", [], |r| r.get(0))?)
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_pair_order_does_not_matter() {
        let (store, ws) = workspace_store();
        let (owner, agent) = (email("owner@x.com"), email("agent@x.com"));

        let first = find_or_create_thread(&store, &ws, &owner, &agent).await.unwrap();
        let second = find_or_create_thread(&store, &ws, &agent, &owner).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(thread_count(&store), 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_idempotent() {
        let (store, ws) = workspace_store();
        let (owner, agent) = (email("owner@x.com"), email("agent@x.com"));

        let first = find_or_create_thread(&store, &ws, &owner, &agent).await.unwrap();
        let again = find_or_create_thread(&store, &ws, &owner, &agent).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(thread_count(&store), 1);

        let thread = store.with(|db| db.get_thread(&first)).unwrap();
        assert_eq!(thread.participants, [owner, agent]);
    }

    #[tokio::test]
    async fn test_lost_race_converges_on_one_thread() {
        let (store, ws) = workspace_store();
        let (owner, agent) = (email("owner@x.com"), email("agent@x.com"));

        // Another session created the thread between our lookup and insert.
        let theirs = Thread {
            id: ThreadId::for_pair(&ws, &agent, &owner),
            workspace: ws.clone(),
            participants: [agent.clone(), owner.clone()],
            created_at: Utc::now(),
        };
        let stored = store.create_thread(&theirs).await.unwrap();
        let ours = store
            .create_thread(&Thread {
                participants: [owner.clone(), agent.clone()],
                ..theirs.clone()
            })
            .await
            .unwrap();

        assert_eq!(stored.id, ours.id);
        assert_eq!(ours.participants, [agent, owner]);
        assert_eq!(thread_count(&store), 1);
    }

    #[tokio::test]
    async fn test_distinct_pairs_get_distinct_threads() {
        let (store, ws) = workspace_store();
        let owner = email("owner@x.com");

        let a = find_or_create_thread(&store, &ws, &owner, &email("a@x.com")).await.unwrap();
        let b = find_or_create_thread(&store, &ws, &owner, &email("b@x.com")).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(thread_count(&store), 2);
    }

    #[tokio::test]
    async fn test_same_participant_twice_is_rejected() {
        let (store, ws) = workspace_store();
        let owner = email("owner@x.com");

        let err = find_or_create_thread(&store, &ws, &owner, &owner)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::SameParticipants)
        ));
        assert_eq!(thread_count(&store), 0);
    }
}
