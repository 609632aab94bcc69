use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use crate::models::{MessageRow, NewMessage};
use crate::{Database, StoreError, timestamp};

const MESSAGE_COLUMNS: &str =
    "id, sender_id, recipient_id, listing_id, content, created_at, is_read";

impl Database {
    /// Append a message. Fails with `NotFound` if the recipient or the listing
    /// does not exist.
    pub fn insert_message(&self, message: &NewMessage) -> Result<MessageRow, StoreError> {
        self.with_tx(|tx| {
            if !exists(tx, "SELECT 1 FROM users WHERE id = ?1", &message.recipient_id)? {
                return Err(StoreError::NotFound("recipient"));
            }
            if !exists(tx, "SELECT 1 FROM listings WHERE id = ?1", &message.listing_id)? {
                return Err(StoreError::NotFound("listing"));
            }

            tx.execute(
                "INSERT INTO messages (id, sender_id, recipient_id, listing_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    &message.id,
                    &message.sender_id,
                    &message.recipient_id,
                    &message.listing_id,
                    &message.content,
                    timestamp(message.created_at),
                ),
            )?;

            let sql = format!("SELECT {} FROM messages WHERE id = ?1", MESSAGE_COLUMNS);
            Ok(tx.query_row(&sql, [&message.id], message_from_row)?)
        })
    }

    /// Every message the user sent or received, in arrival order.
    pub fn messages_for_user(&self, user_id: &str) -> Result<Vec<MessageRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM messages
                 WHERE sender_id = ?1 OR recipient_id = ?1
                 ORDER BY rowid ASC",
                MESSAGE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], message_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Marks the requester's unread messages in the thread as read and returns
    /// the whole thread oldest-first. Both steps share one transaction, so a
    /// concurrent reader sees either none or all of the thread marked.
    pub fn read_thread(
        &self,
        requester_id: &str,
        counterparty_id: &str,
        listing_id: &str,
    ) -> Result<Vec<MessageRow>, StoreError> {
        self.with_tx(|tx| {
            let marked = tx.execute(
                "UPDATE messages SET is_read = 1
                 WHERE recipient_id = ?1 AND sender_id = ?2 AND listing_id = ?3 AND is_read = 0",
                (requester_id, counterparty_id, listing_id),
            )?;
            if marked > 0 {
                debug!("Marked {} messages read for {}", marked, requester_id);
            }

            let sql = format!(
                "SELECT {} FROM messages
                 WHERE listing_id = ?3
                   AND ((sender_id = ?1 AND recipient_id = ?2)
                     OR (sender_id = ?2 AND recipient_id = ?1))
                 ORDER BY created_at ASC, rowid ASC",
                MESSAGE_COLUMNS
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map((requester_id, counterparty_id, listing_id), message_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn exists(conn: &Connection, sql: &str, id: &str) -> Result<bool, StoreError> {
    Ok(conn.query_row(sql, [id], |_| Ok(())).optional()?.is_some())
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get("id")?,
        sender_id: row.get("sender_id")?,
        recipient_id: row.get("recipient_id")?,
        listing_id: row.get("listing_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        is_read: row.get("is_read")?,
    })
}
