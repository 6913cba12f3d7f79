//! Persisted email-confirmation flags.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::OptionalExtension;

use contoso_core::error::ContosoError;

use crate::db::Database;

const KEY_PREFIX: &str = "contoso.email_confirmed.";

/// Namespaced storage key for an email address.
///
/// Addresses are compared case-insensitively and without surrounding whitespace.
pub fn confirmation_key(email: &str) -> String {
    format!("{}{}", KEY_PREFIX, email.trim().to_lowercase())
}

/// Repository for per-email confirmation flags.
pub struct ConfirmationRepository {
    db: Arc<Database>,
}

impl ConfirmationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Read the stored flag. A missing row reads as `false`.
    pub fn is_confirmed(&self, email: &str) -> Result<bool, ContosoError> {
        let key = confirmation_key(email);
        self.db.with_conn(|conn| {
            let confirmed: Option<i64> = conn
                .query_row(
                    "SELECT confirmed FROM identity_confirmations WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| ContosoError::Storage(format!("Failed to read confirmation: {}", e)))?;
            Ok(confirmed == Some(1))
        })
    }

    /// Mark an email as confirmed. Repeated calls leave a single row.
    pub fn confirm(&self, email: &str) -> Result<(), ContosoError> {
        let key = confirmation_key(email);
        let normalized = email.trim().to_lowercase();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO identity_confirmations (key, email, confirmed, updated_at)
                 VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(key) DO UPDATE SET confirmed = 1, updated_at = excluded.updated_at",
                rusqlite::params![key, normalized, Utc::now().timestamp()],
            )
            .map_err(|e| ContosoError::Storage(format!("Failed to save confirmation: {}", e)))?;
            Ok(())
        })
    }
}
