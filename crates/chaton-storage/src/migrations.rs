//! Database schema migrations.
//!
//! Version 1 creates the users, product_catalog and feedback tables.
//! Version 2 adds the FTS5 index over product descriptions and the triggers
//! that keep it in sync with the catalog.

use rusqlite::Connection;
use tracing::info;

use chaton_core::error::ChatonError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), ChatonError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ChatonError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ChatonError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }
    if current_version < 2 {
        apply_v2(conn)?;
        info!("Applied migration v2: description_fts");
    }

    Ok(())
}

/// Version 1: users, catalog and feedback.
fn apply_v1(conn: &Connection) -> Result<(), ChatonError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            username            TEXT NOT NULL UNIQUE,
            password_hash       TEXT NOT NULL,
            role                TEXT NOT NULL DEFAULT 'user'
                                CHECK (role IN ('user', 'admin')),
            shop_name           TEXT NOT NULL DEFAULT '',
            shop_address        TEXT NOT NULL DEFAULT '',
            contact_email       TEXT NOT NULL DEFAULT '',
            phone_number        TEXT NOT NULL DEFAULT '',
            shop_description    TEXT NOT NULL DEFAULT '',
            created_at          INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE TABLE IF NOT EXISTS product_catalog (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL,
            name            TEXT NOT NULL,
            brand           TEXT NOT NULL DEFAULT '',
            size            TEXT NOT NULL DEFAULT '',
            price           REAL NOT NULL DEFAULT 0,
            description     TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_product_catalog_user
            ON product_catalog (user_id);

        CREATE TABLE IF NOT EXISTS feedback (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id      INTEGER,
            product_name    TEXT NOT NULL,
            feedback_text   TEXT NOT NULL,
            sentiment       TEXT NOT NULL
                            CHECK (sentiment IN ('positive', 'negative', 'neutral')),
            created_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            FOREIGN KEY (product_id) REFERENCES product_catalog(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_feedback_product_name
            ON feedback (product_name COLLATE NOCASE);

        CREATE INDEX IF NOT EXISTS idx_feedback_created
            ON feedback (created_at DESC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| ChatonError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

/// Version 2: external-content FTS5 index over product descriptions.
fn apply_v2(conn: &Connection) -> Result<(), ChatonError> {
    conn.execute_batch(
        "
        CREATE VIRTUAL TABLE IF NOT EXISTS product_catalog_fts USING fts5(
            description,
            content='product_catalog',
            content_rowid='id'
        );

        CREATE TRIGGER IF NOT EXISTS product_catalog_ai AFTER INSERT ON product_catalog BEGIN
            INSERT INTO product_catalog_fts (rowid, description)
            VALUES (new.id, new.description);
        END;

        CREATE TRIGGER IF NOT EXISTS product_catalog_ad AFTER DELETE ON product_catalog BEGIN
            INSERT INTO product_catalog_fts (product_catalog_fts, rowid, description)
            VALUES ('delete', old.id, old.description);
        END;

        CREATE TRIGGER IF NOT EXISTS product_catalog_au AFTER UPDATE ON product_catalog BEGIN
            INSERT INTO product_catalog_fts (product_catalog_fts, rowid, description)
            VALUES ('delete', old.id, old.description);
            INSERT INTO product_catalog_fts (rowid, description)
            VALUES (new.id, new.description);
        END;

        INSERT INTO product_catalog_fts (product_catalog_fts) VALUES ('rebuild');

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (2, 'description_fts');
        ",
    )
    .map_err(|e| ChatonError::Storage(format!("Failed to apply migration v2: {}", e)))?;

    Ok(())
}
