//! Database schema and migrations.
//!
//! Migrations are additive: an older store is brought forward one version at
//! a time and never loses records.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the database schema.
pub fn initialize(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version > SCHEMA_VERSION {
        return Err(Error::UnsupportedSchema {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    if version < SCHEMA_VERSION {
        let tx = conn.unchecked_transaction()?;
        migrate(&tx, version)?;
        tx.commit()?;
    }

    Ok(())
}

/// Get the current schema version.
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32> {
    // Check if the schema_version table exists
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 =
        conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0))?;

    Ok(version)
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Run every migration after `old_version`, in order.
fn migrate(conn: &Connection, old_version: i32) -> Result<()> {
    if old_version < 1 {
        create_schema_v1(conn)?;
    }
    if old_version < 2 {
        migrate_to_v2(conn)?;
    }

    info!("Migrated schema from v{} to v{}", old_version, SCHEMA_VERSION);
    set_schema_version(conn, SCHEMA_VERSION)?;
    Ok(())
}

/// Version 1: restaurants and synced reviews.
pub(crate) fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS restaurants (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            neighborhood TEXT NOT NULL,
            cuisine_type TEXT NOT NULL,
            lat REAL NOT NULL,
            lng REAL NOT NULL,
            photograph TEXT,
            operating_hours TEXT NOT NULL,
            is_favorite INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_restaurants_created_at
            ON restaurants(created_at);

        -- Server-confirmed reviews
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY,
            restaurant_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            rating INTEGER NOT NULL,
            comments TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_reviews_restaurant
            ON reviews(restaurant_id);
        CREATE INDEX IF NOT EXISTS idx_reviews_created_at
            ON reviews(created_at);
        "#,
    )?;

    Ok(())
}

/// Version 2: offline review queue and favorite markers.
fn migrate_to_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS pending_reviews (
            id INTEGER PRIMARY KEY,
            restaurant_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            rating INTEGER NOT NULL,
            comments TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pending_reviews_restaurant
            ON pending_reviews(restaurant_id);

        CREATE TABLE IF NOT EXISTS favorites (
            id INTEGER PRIMARY KEY,
            is_favorite INTEGER NOT NULL,
            synced INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;

    Ok(())
}
