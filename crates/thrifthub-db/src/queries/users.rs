use rusqlite::{Connection, OptionalExtension, Row};

use super::placeholders;
use crate::error::is_unique_violation;
use crate::models::{NewUser, UserPatch, UserRow};
use crate::{Database, StoreError, timestamp};

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, avatar, location, is_verified, \
                            rating, total_sales, total_purchases, joined_at";

impl Database {
    /// Insert a new user. The UNIQUE index on `email` turns a duplicate into
    /// `Conflict`, including when two registrations race.
    pub fn create_user(&self, user: &NewUser) -> Result<UserRow, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, phone, password_hash, joined_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    &user.id,
                    &user.name,
                    &user.email,
                    &user.phone,
                    &user.password_hash,
                    timestamp(user.joined_at),
                ),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict("Email already registered")
                } else {
                    e.into()
                }
            })?;

            query_user_by_id(conn, &user.id)?.ok_or(StoreError::NotFound("user"))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
            Ok(conn.query_row(&sql, [email], user_from_row).optional()?)
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Batch-fetch users for a set of ids. Missing ids are simply absent.
    pub fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<UserRow>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users WHERE id IN ({})",
                USER_COLUMNS,
                placeholders(ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids), user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Apply the supplied profile fields and return the updated row.
    pub fn update_user(&self, id: &str, patch: &UserPatch) -> Result<UserRow, StoreError> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    phone = COALESCE(?3, phone),
                    avatar = COALESCE(?4, avatar),
                    location = COALESCE(?5, location)
                 WHERE id = ?1",
                (id, &patch.name, &patch.phone, &patch.avatar, &patch.location),
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }

            query_user_by_id(tx, id)?.ok_or(StoreError::NotFound("user"))
        })
    }
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>, StoreError> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    Ok(conn.query_row(&sql, [id], user_from_row).optional()?)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        password_hash: row.get("password_hash")?,
        avatar: row.get("avatar")?,
        location: row.get("location")?,
        is_verified: row.get("is_verified")?,
        rating: row.get("rating")?,
        total_sales: row.get("total_sales")?,
        total_purchases: row.get("total_purchases")?,
        joined_at: row.get("joined_at")?,
    })
}
