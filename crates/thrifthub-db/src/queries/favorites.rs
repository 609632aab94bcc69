use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use super::listings::listing_from_row;
use crate::error::is_unique_violation;
use crate::models::ListingRow;
use crate::{Database, StoreError, timestamp};

impl Database {
    pub fn add_favorite(
        &self,
        id: &str,
        user_id: &str,
        listing_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.with_tx(|tx| {
            let listing_exists = tx
                .query_row("SELECT 1 FROM listings WHERE id = ?1", [listing_id], |_| Ok(()))
                .optional()?
                .is_some();
            if !listing_exists {
                return Err(StoreError::NotFound("listing"));
            }

            tx.execute(
                "INSERT INTO favorites (id, user_id, listing_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, listing_id, timestamp(now)),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict("Already favorited")
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    pub fn remove_favorite(&self, user_id: &str, listing_id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM favorites WHERE user_id = ?1 AND listing_id = ?2",
                (user_id, listing_id),
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound("favorite"));
            }
            Ok(())
        })
    }

    /// The user's favorited listings, most recently favorited first. The inner
    /// join drops links whose listing no longer exists.
    pub fn list_favorites(&self, user_id: &str) -> Result<Vec<ListingRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.seller_id, l.title, l.description, l.price, l.category,
                        l.item_condition, l.location, l.tags, l.images, l.views, l.is_sold,
                        l.created_at, l.updated_at
                 FROM favorites f
                 JOIN listings l ON l.id = f.listing_id
                 WHERE f.user_id = ?1
                 ORDER BY f.created_at DESC, f.rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], listing_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
