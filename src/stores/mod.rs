//! Preference Stores
//!
//! Two small write-through stores over durable key-value storage:
//!
//! - **auth**: the bearer credential
//! - **settings**: the backend server address
//!
//! Both are owned by a [`Stores`] container which is passed explicitly to
//! whatever needs it (the API client, the bootstrap sequence, the CLI).

pub mod auth;
pub mod settings;

pub use auth::AuthStore;
pub use settings::{ServerAddress, SettingsStore, DEFAULT_HOST, DEFAULT_PORT};

use std::sync::Arc;

use crate::storage::{KeyValueStorage, StorageResult};

/// Container for the application's preference stores
#[derive(Debug, Clone)]
pub struct Stores {
    pub auth: Arc<AuthStore>,
    pub settings: Arc<SettingsStore>,
}

impl Stores {
    /// Load both stores from the same storage backend
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> StorageResult<Self> {
        Self::load_with_defaults(storage, ServerAddress::default())
    }

    /// Load both stores, using `server_defaults` where no address is persisted
    pub fn load_with_defaults(
        storage: Arc<dyn KeyValueStorage>,
        server_defaults: ServerAddress,
    ) -> StorageResult<Self> {
        let auth = AuthStore::load(Arc::clone(&storage))?;
        let settings = SettingsStore::load_with_defaults(storage, server_defaults)?;

        Ok(Self {
            auth: Arc::new(auth),
            settings: Arc::new(settings),
        })
    }
}
