//! Invite-list maintenance for workspace owners.

use huddle_shared::{Email, Uid};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::rows::{email_at, encode_ts, stored_now};

impl Database {
    /// Invite `email` into `owner`'s workspace. Returns `false` if it was
    /// already on the list.
    pub fn add_contact(&self, owner: &Uid, email: &Email) -> Result<bool> {
        if !self.user_exists(owner)? {
            return Err(StoreError::NotFound);
        }
        let affected = self.conn().execute(
            "INSERT OR IGNORE INTO contacts (owner_uid, email, added_at)
             VALUES (?1, ?2, ?3)",
            params![owner.as_str(), email.as_str(), encode_ts(&stored_now())],
        )?;
        tracing::debug!(owner = %owner, email = %email, added = affected > 0, "add contact");
        Ok(affected > 0)
    }

    /// Remove `email` from the invite list.  Returns `true` if a row was
    /// deleted. Existing threads are left alone.
    pub fn remove_contact(&self, owner: &Uid, email: &Email) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM contacts WHERE owner_uid = ?1 AND email = ?2",
            params![owner.as_str(), email.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// The invite list in the order entries were added.
    pub fn list_contacts(&self, owner: &Uid) -> Result<Vec<Email>> {
        let mut stmt = self.conn().prepare(
            "SELECT email FROM contacts
             WHERE owner_uid = ?1
             ORDER BY added_at ASC, email ASC",
        )?;
        let rows = stmt.query_map(params![owner.as_str()], |row| email_at(row, 0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}
