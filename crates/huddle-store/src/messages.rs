use huddle_shared::ThreadId;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::feed::ThreadChange;
use crate::models::{Message, NewMessage};
use crate::rows::{email_at, encode_ts, stored_now, thread_id_at, ts_at, uuid_at};

impl Database {
    /// Append a message to a thread and notify live subscribers.
    ///
    /// The timestamp is assigned here and is never earlier than the newest
    /// message already in the thread, even if the wall clock stepped back.
    pub fn append_message(&self, thread_id: &ThreadId, message: &NewMessage) -> Result<Message> {
        let thread = self.get_thread(thread_id)?;

        let tx = self.conn().unchecked_transaction()?;

        let newest = tx
            .query_row(
                "SELECT timestamp FROM messages
                 WHERE thread_id = ?1
                 ORDER BY timestamp DESC, seq DESC
                 LIMIT 1",
                params![thread_id.to_string()],
                |row| ts_at(row, 0),
            )
            .optional()?;

        let now = stored_now();
        let timestamp = match newest {
            Some(last) if last > now => last,
            _ => now,
        };

        let stored = Message {
            id: Uuid::new_v4(),
            thread_id: thread_id.clone(),
            from_email: message.from_email.clone(),
            to_email: message.to_email.clone(),
            text: message.text.clone(),
            timestamp,
        };

        tx.execute(
            "INSERT INTO messages (id, thread_id, from_email, to_email, text, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                stored.id.to_string(),
                thread_id.to_string(),
                stored.from_email.as_str(),
                stored.to_email.as_str(),
                stored.text,
                encode_ts(&stored.timestamp),
            ],
        )?;
        tx.commit()?;

        self.publish_change(ThreadChange {
            workspace: thread.workspace,
            thread_id: thread_id.clone(),
        });

        Ok(stored)
    }

    /// All messages of a thread, oldest first. Equal timestamps keep
    /// insertion order.
    pub fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, thread_id, from_email, to_email, text, timestamp
             FROM messages
             WHERE thread_id = ?1
             ORDER BY timestamp ASC, seq ASC",
        )?;

        let rows = stmt.query_map(params![thread_id.to_string()], row_to_message)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: uuid_at(row, 0)?,
        thread_id: thread_id_at(row, 1)?,
        from_email: email_at(row, 2)?,
        to_email: email_at(row, 3)?,
        text: row.get(4)?,
        timestamp: ts_at(row, 5)?,
    })
}
