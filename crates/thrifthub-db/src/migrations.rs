use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                email           TEXT NOT NULL UNIQUE,
                phone           TEXT NOT NULL,
                password_hash   TEXT NOT NULL,
                avatar          TEXT,
                location        TEXT,
                is_verified     INTEGER NOT NULL DEFAULT 0,
                rating          REAL NOT NULL DEFAULT 0,
                total_sales     INTEGER NOT NULL DEFAULT 0,
                total_purchases INTEGER NOT NULL DEFAULT 0,
                joined_at       TEXT NOT NULL
            );

            CREATE TABLE listings (
                id              TEXT PRIMARY KEY,
                seller_id       TEXT NOT NULL REFERENCES users(id),
                title           TEXT NOT NULL,
                description     TEXT NOT NULL,
                price           REAL NOT NULL,
                category        TEXT NOT NULL,
                item_condition  TEXT NOT NULL,
                location        TEXT NOT NULL,
                tags            TEXT NOT NULL DEFAULT '[]',
                images          TEXT NOT NULL DEFAULT '[]',
                views           INTEGER NOT NULL DEFAULT 0,
                is_sold         INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_listings_recent ON listings(is_sold, created_at);
            CREATE INDEX idx_listings_seller ON listings(seller_id);

            CREATE TABLE favorites (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                listing_id  TEXT NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, listing_id)
            );

            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                sender_id       TEXT NOT NULL REFERENCES users(id),
                recipient_id    TEXT NOT NULL REFERENCES users(id),
                listing_id      TEXT NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
                content         TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                is_read         INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_messages_sender ON messages(sender_id);
            CREATE INDEX idx_messages_recipient ON messages(recipient_id, is_read);
            CREATE INDEX idx_messages_listing ON messages(listing_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
