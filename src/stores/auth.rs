//! Auth Store
//!
//! Holds the bearer credential for the current session.

use std::sync::{Arc, RwLock};

use crate::storage::{KeyValueStorage, StorageError, StorageResult, TOKEN_KEY};

/// Credential store backed by durable storage
pub struct AuthStore {
    storage: Arc<dyn KeyValueStorage>,
    token: RwLock<Option<String>>,
}

impl AuthStore {
    /// Initialize from the persisted `token` entry.
    ///
    /// An empty persisted value counts as no credential.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> StorageResult<Self> {
        let token = storage.get_item(TOKEN_KEY)?.filter(|t| !t.is_empty());

        Ok(Self {
            storage,
            token: RwLock::new(token),
        })
    }

    /// Current credential, if any; never an empty string
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .ok()
            .and_then(|t| t.clone())
            .filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Store a credential; persisted before the in-memory value changes.
    ///
    /// An empty token is no credential and is handled as [`logout`](Self::logout).
    pub fn set_token(&self, token: impl Into<String>) -> StorageResult<()> {
        let token = token.into();
        if token.is_empty() {
            return self.logout();
        }

        let mut current = self
            .token
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        self.storage.set_item(TOKEN_KEY, &token)?;
        *current = Some(token);

        tracing::info!("Credential stored");
        Ok(())
    }

    /// Drop the credential.
    ///
    /// The in-memory credential is cleared even when removing the persisted
    /// entry fails, so a rejected token is never sent again by this process.
    pub fn logout(&self) -> StorageResult<()> {
        let mut current = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = None;

        self.storage.remove_item(TOKEN_KEY)?;

        tracing::info!("Credential cleared");
        Ok(())
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
