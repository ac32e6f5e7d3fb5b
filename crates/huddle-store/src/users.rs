//! CRUD operations for [`User`] records.
//!
//! A user row always travels with its invite list, so every read here also
//! loads the matching `contacts` rows.

use huddle_shared::Uid;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;
use crate::models::User;
use crate::rows::{email_at, encode_ts, ts_at, uid_at};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user together with its initial contacts.
    pub fn create_user(&self, user: &User) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO users (uid, email, is_owner, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.uid.as_str(),
                user.email.as_str(),
                user.is_owner,
                encode_ts(&user.created_at),
            ],
        )?;
        for contact in &user.contacts {
            tx.execute(
                "INSERT OR IGNORE INTO contacts (owner_uid, email, added_at)
                 VALUES (?1, ?2, ?3)",
                params![user.uid.as_str(), contact.as_str(), encode_ts(&user.created_at)],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a user by uid, or `None` if it was never registered.
    pub fn get_user(&self, uid: &Uid) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                "SELECT uid, email, is_owner, created_at FROM users WHERE uid = ?1",
                params![uid.as_str()],
                row_to_user,
            )
            .optional()?;

        match user {
            Some(mut user) => {
                user.contacts = self.list_contacts(&user.uid)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// List every registered user in registration order.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT uid, email, is_owner, created_at
             FROM users
             ORDER BY created_at ASC, uid ASC",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            let mut user = row?;
            user.contacts = self.list_contacts(&user.uid)?;
            users.push(user);
        }
        Ok(users)
    }

    pub fn user_exists(&self, uid: &Uid) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM users WHERE uid = ?1",
                params![uid.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

/// Map a `rusqlite::Row` to a [`User`] with an empty contact list.
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        uid: uid_at(row, 0)?,
        email: email_at(row, 1)?,
        is_owner: row.get(2)?,
        contacts: Vec::new(),
        created_at: ts_at(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::stored_now;
    use huddle_shared::Email;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn owner(uid: &str, mail: &str, contacts: &[&str]) -> User {
        User {
            uid: Uid::new(uid),
            email: email(mail),
            contacts: contacts.iter().map(|c| email(c)).collect(),
            is_owner: true,
            created_at: stored_now(),
        }
    }

    #[test]
    fn test_create_then_get() {
        let db = Database::open_in_memory().unwrap();
        let user = owner("u1", "owner@x.com", &["bob@x.com", "carol@x.com"]);
        db.create_user(&user).unwrap();

        let loaded = db.get_user(&Uid::new("u1")).unwrap().expect("user exists");
        assert_eq!(loaded, user);
        assert!(db.user_exists(&user.uid).unwrap());
    }

    #[test]
    fn test_get_missing_user_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_user(&Uid::new("nobody")).unwrap().is_none());
        assert!(!db.user_exists(&Uid::new("nobody")).unwrap());
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&owner("u1", "a@x.com", &[])).unwrap();
        assert!(db.create_user(&owner("u1", "b@x.com", &[])).is_err());
    }

    #[test]
    fn test_list_users_in_registration_order_with_contacts() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.list_users().unwrap().is_empty());

        db.create_user(&owner("first", "a@x.com", &["bob@x.com"])).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        db.create_user(&owner("second", "b@x.com", &[])).unwrap();

        let users = db.list_users().unwrap();
        let uids: Vec<_> = users.iter().map(|u| u.uid.as_str()).collect();
        assert_eq!(uids, ["first", "second"]);
        assert_eq!(users[0].contacts, vec![email("bob@x.com")]);
        assert!(users[1].contacts.is_empty());
    }
}
