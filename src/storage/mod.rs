//! Durable Key-Value Storage
//!
//! The preference stores persist through a small string-keyed interface so
//! that the backend can be swapped:
//!
//! - **memory**: process-local map, used as a test double
//! - **file**: a JSON object on disk, written through on every mutation
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use admin_console::storage::{FileStorage, KeyValueStorage};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = FileStorage::open("./console/storage.json")?;
//!     storage.set_item("host", "10.0.0.5")?;
//!     assert_eq!(storage.get_item("host")?.as_deref(), Some("10.0.0.5"));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use memory::MemoryStorage;

#[cfg(test)]
pub(crate) use memory::FailingStorage;

/// Persisted key holding the bearer credential
pub const TOKEN_KEY: &str = "token";
/// Persisted key holding the server host
pub const HOST_KEY: &str = "host";
/// Persisted key holding the server port, as text
pub const PORT_KEY: &str = "port";

/// String-keyed durable storage.
///
/// Writes must be durable by the time `set_item`/`remove_item` return.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` if the key has no entry
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Create or replace an entry
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove an entry; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}
