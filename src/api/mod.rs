//! Authenticated HTTP Client
//!
//! This module provides the request-issuing side of the console:
//!
//! - **request**: outgoing request and incoming response values
//! - **middleware**: interceptor traits, the standard interceptors, and the
//!   pipeline that composes them
//! - **transport**: the async `Transport` seam and its reqwest implementation
//! - **client**: `ApiClient`, which runs pipeline → transport → pipeline
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use admin_console::api::{ApiClient, ReqwestTransport};
//! use admin_console::storage::MemoryStorage;
//! use admin_console::stores::Stores;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stores = Stores::load(Arc::new(MemoryStorage::new()))?;
//!     stores.settings.set_server("10.0.0.5", 8080)?;
//!     stores.auth.set_token("abc123")?;
//!
//!     let client = ApiClient::new(&stores, Arc::new(ReqwestTransport::new(None)?));
//!     let tasks: serde_json::Value = client.get_json("/task").await?;
//!     println!("{}", tasks);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod middleware;
pub mod request;
pub mod transport;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult, UNAUTHORIZED};
pub use middleware::{
    BaseAddress, BearerAuth, LogoutOnUnauthorized, Pipeline, RequestInterceptor,
    ResponseInterceptor,
};
pub use request::{IncomingResponse, OutgoingRequest};
pub use transport::{ReqwestTransport, Transport};
