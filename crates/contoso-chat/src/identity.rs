//! Email confirmation gate.
//!
//! Remembers, per email address, whether the shopper confirmed that the
//! address on file is theirs. Confirmations are permanent: there is no
//! expiry and no revocation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use contoso_storage::{confirmation_key, ConfirmationRepository};

use crate::error::ChatError;

/// Backing store for confirmation flags.
pub trait ConfirmationStore: Send + Sync {
    fn is_confirmed(&self, email: &str) -> Result<bool, ChatError>;
    fn confirm(&self, email: &str) -> Result<(), ChatError>;
}

impl ConfirmationStore for ConfirmationRepository {
    fn is_confirmed(&self, email: &str) -> Result<bool, ChatError> {
        Ok(ConfirmationRepository::is_confirmed(self, email)?)
    }

    fn confirm(&self, email: &str) -> Result<(), ChatError> {
        Ok(ConfirmationRepository::confirm(self, email)?)
    }
}

/// Process-local store, used for tests and `--ephemeral` sessions.
#[derive(Default)]
pub struct MemoryConfirmationStore {
    keys: Mutex<HashSet<String>>,
}

impl MemoryConfirmationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfirmationStore for MemoryConfirmationStore {
    fn is_confirmed(&self, email: &str) -> Result<bool, ChatError> {
        let keys = self
            .keys
            .lock()
            .map_err(|e| ChatError::StorageError(format!("confirmation lock poisoned: {}", e)))?;
        Ok(keys.contains(&confirmation_key(email)))
    }

    fn confirm(&self, email: &str) -> Result<(), ChatError> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|e| ChatError::StorageError(format!("confirmation lock poisoned: {}", e)))?;
        keys.insert(confirmation_key(email));
        Ok(())
    }
}

/// Reads and records email confirmations.
///
/// Store failures never block the shopper: a failed read counts as
/// unconfirmed, and a failed write is still honoured for the rest of the
/// process lifetime.
pub struct IdentityGate {
    store: Arc<dyn ConfirmationStore>,
    unsaved: Mutex<HashSet<String>>,
}

impl IdentityGate {
    pub fn new(store: Arc<dyn ConfirmationStore>) -> Self {
        Self {
            store,
            unsaved: Mutex::new(HashSet::new()),
        }
    }

    /// Gate over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryConfirmationStore::new()))
    }

    pub fn is_confirmed(&self, email: &str) -> bool {
        if email.trim().is_empty() {
            return false;
        }
        if self
            .unsaved
            .lock()
            .map(|keys| keys.contains(&confirmation_key(email)))
            .unwrap_or(false)
        {
            return true;
        }
        match self.store.is_confirmed(email) {
            Ok(confirmed) => confirmed,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read email confirmation; treating as unconfirmed");
                false
            }
        }
    }

    /// Record a confirmation. Idempotent.
    pub fn confirm(&self, email: &str) -> Result<(), ChatError> {
        match self.store.confirm(email) {
            Ok(()) => {
                tracing::info!(email = %email, "Email confirmed");
                Ok(())
            }
            Err(e) => {
                if let Ok(mut keys) = self.unsaved.lock() {
                    keys.insert(confirmation_key(email));
                }
                Err(e)
            }
        }
    }
}
