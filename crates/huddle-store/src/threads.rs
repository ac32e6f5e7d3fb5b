//! CRUD operations for [`Thread`] records.

use huddle_shared::{Email, ThreadId, Uid};
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{not_found, Result};
use crate::models::Thread;
use crate::rows::{email_at, encode_ts, thread_id_at, ts_at, uid_at};

impl Database {
    /// Find the thread between `a` and `b` in `workspace`, whichever order
    /// its participants were stored in. At most one row is returned; if
    /// duplicates exist the oldest wins.
    pub fn find_thread(&self, workspace: &Uid, a: &Email, b: &Email) -> Result<Option<Thread>> {
        let thread = self
            .conn()
            .query_row(
                "SELECT id, workspace_uid, participant_a, participant_b, created_at
                 FROM threads
                 WHERE workspace_uid = ?1
                   AND ((participant_a = ?2 AND participant_b = ?3)
                     OR (participant_a = ?3 AND participant_b = ?2))
                 ORDER BY created_at ASC
                 LIMIT 1",
                params![workspace.as_str(), a.as_str(), b.as_str()],
                row_to_thread,
            )
            .optional()?;
        Ok(thread)
    }

    /// Insert `thread` unless a row with the same id already exists.
    /// Returns `true` if this call created it.
    pub fn insert_thread_if_absent(&self, thread: &Thread) -> Result<bool> {
        let [a, b] = &thread.participants;
        let affected = self.conn().execute(
            "INSERT OR IGNORE INTO threads (id, workspace_uid, participant_a, participant_b, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                thread.id.to_string(),
                thread.workspace.as_str(),
                a.as_str(),
                b.as_str(),
                encode_ts(&thread.created_at),
            ],
        )?;
        Ok(affected > 0)
    }

    /// Fetch a single thread by id.
    pub fn get_thread(&self, id: &ThreadId) -> Result<Thread> {
        self.conn()
            .query_row(
                "SELECT id, workspace_uid, participant_a, participant_b, created_at
                 FROM threads
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_thread,
            )
            .map_err(not_found)
    }
}

/// Map a `rusqlite::Row` to a [`Thread`].
fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<Thread> {
    Ok(Thread {
        id: thread_id_at(row, 0)?,
        workspace: uid_at(row, 1)?,
        participants: [email_at(row, 2)?, email_at(row, 3)?],
        created_at: ts_at(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::User;
    use crate::rows::stored_now;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn db_with_workspace(uid: &str) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&User {
            uid: Uid::new(uid),
            email: email("owner@x.com"),
            contacts: Vec::new(),
            is_owner: true,
            created_at: stored_now(),
        })
        .unwrap();
        db
    }

    fn thread(ws: &str, a: &str, b: &str) -> Thread {
        let ws = Uid::new(ws);
        let (a, b) = (email(a), email(b));
        Thread {
            id: ThreadId::for_pair(&ws, &a, &b),
            workspace: ws,
            participants: [a, b],
            created_at: stored_now(),
        }
    }

    #[test]
    fn test_find_matches_either_order() {
        let db = db_with_workspace("ws");
        let t = thread("ws", "owner@x.com", "agent@x.com");
        assert!(db.insert_thread_if_absent(&t).unwrap());

        let ws = Uid::new("ws");
        let fwd = db.find_thread(&ws, &email("owner@x.com"), &email("agent@x.com")).unwrap();
        let rev = db.find_thread(&ws, &email("agent@x.com"), &email("owner@x.com")).unwrap();
        assert_eq!(fwd.as_ref(), Some(&t));
        assert_eq!(rev.as_ref(), Some(&t));
    }

    #[test]
    fn test_find_is_scoped_to_pair_and_workspace() {
        let db = db_with_workspace("ws");
        db.insert_thread_if_absent(&thread("ws", "owner@x.com", "agent@x.com"))
            .unwrap();

        let ws = Uid::new("ws");
        assert!(db
            .find_thread(&ws, &email("owner@x.com"), &email("other@x.com"))
            .unwrap()
            .is_none());
        assert!(db
            .find_thread(&Uid::new("elsewhere"), &email("owner@x.com"), &email("agent@x.com"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_insert_twice_keeps_first() {
        let db = db_with_workspace("ws");
        let t = thread("ws", "owner@x.com", "agent@x.com");
        assert!(db.insert_thread_if_absent(&t).unwrap());

        let mut again = thread("ws", "agent@x.com", "owner@x.com");
        again.created_at = stored_now();
        assert_eq!(again.id, t.id);
        assert!(!db.insert_thread_if_absent(&again).unwrap());

        assert_eq!(db.get_thread(&t.id).unwrap().participants, t.participants);
    }

    #[test]
    fn test_thread_requires_registered_workspace() {
        let db = Database::open_in_memory().unwrap();
        assert!(db
            .insert_thread_if_absent(&thread("ghost", "a@x.com", "b@x.com"))
            .is_err());
    }

    #[test]
    fn test_get_unknown_thread_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let id = thread("ws", "a@x.com", "b@x.com").id;
        assert!(matches!(db.get_thread(&id), Err(StoreError::NotFound)));
    }
}
