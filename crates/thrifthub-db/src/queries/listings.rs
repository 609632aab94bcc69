use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use tracing::info;

use super::placeholders;
use crate::models::{DeletedListing, ListingFilter, ListingPatch, ListingRow, NewListing};
use crate::{Database, StoreError, timestamp};

/// Category value that means "no category filter".
pub const ALL_CATEGORIES: &str = "all";

const LISTING_COLUMNS: &str = "l.id, l.seller_id, l.title, l.description, l.price, l.category, \
                               l.item_condition, l.location, l.tags, l.images, l.views, l.is_sold, \
                               l.created_at, l.updated_at";

impl Database {
    pub fn create_listing(&self, listing: &NewListing) -> Result<ListingRow, StoreError> {
        let tags = serde_json::to_string(&listing.tags)?;
        let images = serde_json::to_string(&listing.images)?;
        let created = timestamp(listing.created_at);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO listings (id, seller_id, title, description, price, category,
                                       item_condition, location, tags, images, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                rusqlite::params![
                    listing.id,
                    listing.seller_id,
                    listing.title,
                    listing.description,
                    listing.price,
                    listing.category,
                    listing.condition,
                    listing.location,
                    tags,
                    images,
                    created,
                ],
            )?;

            query_listing(conn, &listing.id)?.ok_or(StoreError::NotFound("listing"))
        })
    }

    /// One page of listings matching `filter`, newest first, plus the total
    /// number of matches before pagination. `page` is 1-based.
    pub fn query_listings(
        &self,
        filter: &ListingFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<ListingRow>, u64), StoreError> {
        let (where_clause, mut params) = filter_clause(filter);
        let skip = i64::from(page.saturating_sub(1)) * i64::from(limit);

        self.with_conn(|conn| {
            let count_sql = format!("SELECT COUNT(*) FROM listings l {}", where_clause);
            let total: i64 =
                conn.query_row(&count_sql, params_from_iter(params.iter()), |r| r.get(0))?;

            params.push(Value::Integer(i64::from(limit)));
            let limit_idx = params.len();
            params.push(Value::Integer(skip));
            let offset_idx = params.len();

            let sql = format!(
                "SELECT {} FROM listings l {}
                 ORDER BY l.created_at DESC, l.rowid DESC
                 LIMIT ?{} OFFSET ?{}",
                LISTING_COLUMNS, where_clause, limit_idx, offset_idx
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), listing_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok((rows, total as u64))
        })
    }

    /// Plain read, no side effects.
    pub fn get_listing(&self, id: &str) -> Result<Option<ListingRow>, StoreError> {
        self.with_conn(|conn| query_listing(conn, id))
    }

    /// Detail read: bumps the view counter and returns the listing with the
    /// new count, in one transaction.
    pub fn view_listing(&self, id: &str) -> Result<ListingRow, StoreError> {
        self.with_tx(|tx| {
            let changed = tx.execute("UPDATE listings SET views = views + 1 WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(StoreError::NotFound("listing"));
            }
            query_listing(tx, id)?.ok_or(StoreError::NotFound("listing"))
        })
    }

    pub fn get_listings_by_ids(&self, ids: &[String]) -> Result<Vec<ListingRow>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM listings l WHERE l.id IN ({})",
                LISTING_COLUMNS,
                placeholders(ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(ids), listing_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Owner-only partial update. Touches `updated_at`.
    pub fn update_listing(
        &self,
        id: &str,
        requester_id: &str,
        patch: &ListingPatch,
        now: DateTime<Utc>,
    ) -> Result<ListingRow, StoreError> {
        let tags = patch.tags.as_ref().map(serde_json::to_string).transpose()?;

        self.with_tx(|tx| {
            ensure_owner(tx, id, requester_id)?;

            tx.execute(
                "UPDATE listings SET
                    title = COALESCE(?2, title),
                    description = COALESCE(?3, description),
                    price = COALESCE(?4, price),
                    category = COALESCE(?5, category),
                    item_condition = COALESCE(?6, item_condition),
                    location = COALESCE(?7, location),
                    tags = COALESCE(?8, tags),
                    is_sold = COALESCE(?9, is_sold),
                    updated_at = ?10
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    patch.title,
                    patch.description,
                    patch.price,
                    patch.category,
                    patch.condition,
                    patch.location,
                    tags,
                    patch.is_sold,
                    timestamp(now),
                ],
            )?;

            query_listing(tx, id)?.ok_or(StoreError::NotFound("listing"))
        })
    }

    /// Owner-only delete. Favorites and messages about the listing go in the
    /// same transaction, so no orphan is ever visible.
    pub fn delete_listing(&self, id: &str, requester_id: &str) -> Result<DeletedListing, StoreError> {
        let deleted = self.with_tx(|tx| {
            let listing = ensure_owner(tx, id, requester_id)?;

            let favorites_removed =
                tx.execute("DELETE FROM favorites WHERE listing_id = ?1", [id])?;
            let messages_removed = tx.execute("DELETE FROM messages WHERE listing_id = ?1", [id])?;
            tx.execute("DELETE FROM listings WHERE id = ?1", [id])?;

            Ok(DeletedListing {
                images: listing.images,
                favorites_removed,
                messages_removed,
            })
        })?;

        info!(
            "Listing {} deleted ({} favorites, {} messages removed)",
            id, deleted.favorites_removed, deleted.messages_removed
        );
        Ok(deleted)
    }
}

fn ensure_owner(conn: &Connection, id: &str, requester_id: &str) -> Result<ListingRow, StoreError> {
    let listing = query_listing(conn, id)?.ok_or(StoreError::NotFound("listing"))?;
    if listing.seller_id != requester_id {
        return Err(StoreError::Forbidden("Only the seller can modify this listing"));
    }
    Ok(listing)
}

pub(crate) fn query_listing(conn: &Connection, id: &str) -> Result<Option<ListingRow>, StoreError> {
    let sql = format!("SELECT {} FROM listings l WHERE l.id = ?1", LISTING_COLUMNS);
    Ok(conn.query_row(&sql, [id], listing_from_row).optional()?)
}

pub(crate) fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get("id")?,
        seller_id: row.get("seller_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        price: row.get("price")?,
        category: row.get("category")?,
        condition: row.get("item_condition")?,
        location: row.get("location")?,
        tags: json_list(row, "tags")?,
        images: json_list(row, "images")?,
        views: row.get("views")?,
        is_sold: row.get("is_sold")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn json_list(row: &Row<'_>, column: &str) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| {
        let idx = row.as_ref().column_index(column).unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

/// Build the WHERE clause and its positional parameters for `filter`.
fn filter_clause(filter: &ListingFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if !filter.include_sold {
        clauses.push("l.is_sold = 0".to_string());
    }

    if let Some(category) = filter.category.as_deref().filter(|c| *c != ALL_CATEGORIES) {
        params.push(Value::Text(category.to_string()));
        clauses.push(format!("l.category = ?{}", params.len()));
    }

    if let Some(location) = filter.location.as_deref() {
        params.push(Value::Text(location.to_lowercase()));
        clauses.push(format!("instr(casefold(l.location), ?{}) > 0", params.len()));
    }

    if let Some(min) = filter.price_min {
        params.push(Value::Real(min));
        clauses.push(format!("l.price >= ?{}", params.len()));
    }

    if let Some(max) = filter.price_max {
        params.push(Value::Real(max));
        clauses.push(format!("l.price <= ?{}", params.len()));
    }

    if let Some(search) = filter.search.as_deref() {
        params.push(Value::Text(search.to_lowercase()));
        let pattern = params.len();
        params.push(Value::Text(search.to_string()));
        let tag = params.len();
        clauses.push(format!(
            "(instr(casefold(l.title), ?{p}) > 0 OR instr(casefold(l.description), ?{p}) > 0 \
             OR EXISTS (SELECT 1 FROM json_each(l.tags) WHERE json_each.value = ?{t}))",
            p = pattern,
            t = tag
        ));
    }

    if let Some(seller_id) = filter.seller_id.as_deref() {
        params.push(Value::Text(seller_id.to_string()));
        clauses.push(format!("l.seller_id = ?{}", params.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (where_clause, params)
}
