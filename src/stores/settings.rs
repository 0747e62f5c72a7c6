//! Settings Store
//!
//! Holds the address of the backend server the client talks to.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use crate::storage::{KeyValueStorage, StorageError, StorageResult, HOST_KEY, PORT_KEY};

/// Host used when nothing is persisted
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port used when nothing is persisted
pub const DEFAULT_PORT: u16 = 5000;

/// Host/port pair identifying the backend, both kept as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub host: String,
    pub port: String,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port: port.to_string(),
        }
    }

    /// Base address for outgoing calls: always plain `http`, no path prefix
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl std::fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Server address store backed by durable storage
pub struct SettingsStore {
    storage: Arc<dyn KeyValueStorage>,
    address: RwLock<ServerAddress>,
}

impl SettingsStore {
    /// Initialize from persisted `host`/`port`, defaulting to `127.0.0.1:5000`
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> StorageResult<Self> {
        Self::load_with_defaults(storage, ServerAddress::default())
    }

    /// Initialize from persisted `host`/`port`, filling gaps from `defaults`.
    ///
    /// Each key falls back independently; empty values count as missing.
    pub fn load_with_defaults(
        storage: Arc<dyn KeyValueStorage>,
        defaults: ServerAddress,
    ) -> StorageResult<Self> {
        let host = storage
            .get_item(HOST_KEY)?
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);
        let port = storage
            .get_item(PORT_KEY)?
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.port);

        Ok(Self {
            storage,
            address: RwLock::new(ServerAddress { host, port }),
        })
    }

    /// Snapshot of the current address
    pub fn server_address(&self) -> ServerAddress {
        match self.address.read() {
            Ok(address) => address.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn host(&self) -> String {
        self.server_address().host
    }

    pub fn port(&self) -> String {
        self.server_address().port
    }

    /// Change the server address; both keys are persisted before the
    /// in-memory value changes.
    ///
    /// If the port cannot be written the host entry is restored, so storage
    /// never holds a host from one address and a port from another.
    pub fn set_server(&self, host: impl Into<String>, port: u16) -> StorageResult<()> {
        let next = ServerAddress::new(host, port);
        let mut current = self
            .address
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        let previous_host = self.storage.get_item(HOST_KEY)?;
        self.storage.set_item(HOST_KEY, &next.host)?;

        if let Err(e) = self.storage.set_item(PORT_KEY, &next.port) {
            let restored = match &previous_host {
                Some(host) => self.storage.set_item(HOST_KEY, host),
                None => self.storage.remove_item(HOST_KEY),
            };
            if let Err(restore_err) = restored {
                tracing::error!("Failed to restore persisted host: {}", restore_err);
            }
            return Err(e);
        }

        tracing::info!(server = %next, "Server address updated");
        *current = next;
        Ok(())
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("address", &self.server_address())
            .finish()
    }
}
