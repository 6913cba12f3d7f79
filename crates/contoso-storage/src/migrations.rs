//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use contoso_core::error::ContosoError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), ContosoError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ContosoError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ContosoError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: identity_confirmations");
    }

    Ok(())
}

/// Version 1: per-email confirmation flags.
fn apply_v1(conn: &Connection) -> Result<(), ContosoError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS identity_confirmations (
            key             TEXT PRIMARY KEY NOT NULL,
            email           TEXT NOT NULL,
            confirmed       INTEGER NOT NULL DEFAULT 0
                            CHECK (confirmed IN (0, 1)),
            updated_at      INTEGER NOT NULL
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'identity_confirmations');
        ",
    )
    .map_err(|e| ContosoError::Storage(format!("Failed to apply migration v1: {}", e)))
}
