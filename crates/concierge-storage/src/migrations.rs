//! Database schema migrations.
//!
//! Applies the initial schema: rooms, stock_items, reservations, history and
//! the schema_migrations bookkeeping table.

use rusqlite::Connection;
use tracing::info;

use concierge_core::error::ConciergeError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), ConciergeError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ConciergeError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| {
            ConciergeError::Storage(format!("Failed to query migration version: {}", e))
        })?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: front_desk_schema");
    }

    Ok(())
}

/// Version 1: front desk schema.
fn apply_v1(conn: &Connection) -> Result<(), ConciergeError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS rooms (
            number      TEXT PRIMARY KEY NOT NULL,
            room_type   TEXT NOT NULL,
            floor       INTEGER NOT NULL DEFAULT 0,
            status      TEXT NOT NULL DEFAULT 'available'
                        CHECK (status IN ('available', 'occupied', 'cleaning', 'out_of_service'))
        );

        CREATE TABLE IF NOT EXISTS stock_items (
            name        TEXT PRIMARY KEY NOT NULL COLLATE NOCASE,
            quantity    INTEGER NOT NULL DEFAULT 0,
            unit        TEXT NOT NULL DEFAULT 'buc',
            price       INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS reservations (
            id          TEXT PRIMARY KEY NOT NULL,
            room_number TEXT NOT NULL,
            guest_name  TEXT NOT NULL,
            phone       TEXT,
            start_date  TEXT NOT NULL,
            end_date    TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'confirmed'
                        CHECK (status IN ('confirmed', 'checked_in', 'checked_out', 'cancelled')),
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            FOREIGN KEY (room_number) REFERENCES rooms(number)
        );

        CREATE INDEX IF NOT EXISTS idx_reservations_room
            ON reservations (room_number, start_date);

        CREATE INDEX IF NOT EXISTS idx_reservations_status
            ON reservations (status, start_date);

        CREATE TABLE IF NOT EXISTS history (
            id          TEXT PRIMARY KEY NOT NULL,
            timestamp   INTEGER NOT NULL,
            kind        TEXT NOT NULL
                        CHECK (kind IN ('chat', 'reservation', 'automation')),
            text        TEXT NOT NULL DEFAULT '',
            intent      TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_history_timestamp
            ON history (timestamp DESC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'front_desk_schema');
        ",
    )
    .map_err(|e| ConciergeError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}
