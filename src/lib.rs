//! # Admin Console
//!
//! Client-side shell of a remote administration dashboard: persisted
//! preferences, an authenticated HTTP client, and the console's route table.
//!
//! ## Features
//!
//! - **Write-through preferences**: credential and server address survive restarts
//! - **Interceptor pipeline**: every call gets the base address and bearer
//!   credential; a 401 clears the stored credential
//! - **Route table**: nested layout routes with dynamic segments
//! - **Bootstrap**: one startup redirect to the login page when no credential
//!   is stored
//!
//! ## Modules
//!
//! - [`storage`]: Durable key-value storage
//! - [`stores`]: Auth and settings preference stores
//! - [`api`]: HTTP client, interceptors and transport
//! - [`router`]: Path to page mapping
//! - [`app`]: Bootstrap sequence
//! - [`config`]: Configuration loading
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use admin_console::{App, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::from_config(&Config::load_default())?;
//!
//!     if app.stores().auth.is_authenticated() {
//!         let tasks: serde_json::Value = app.client().get_json("/task").await?;
//!         println!("{}", tasks);
//!     } else {
//!         println!("Log in first (landed on {:?})", app.current().map(|m| &m.path));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod router;
pub mod storage;
pub mod stores;

// Re-export top-level types for convenience
pub use api::{
    ApiClient, ApiError, ApiResult, IncomingResponse, OutgoingRequest, Pipeline,
    RequestInterceptor, ResponseInterceptor, ReqwestTransport, Transport,
};

pub use app::{App, AppBuilder, AppError, InstallContext, Plugin};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};

pub use router::{Page, RouteMatch, Router, RouterError};

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError, StorageResult};

pub use stores::{AuthStore, ServerAddress, SettingsStore, Stores};
