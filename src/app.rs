//! Application Bootstrap
//!
//! Builds the console once at startup: store container, router, plugins and
//! API client, then picks the first location. Without a stored credential the
//! first location is always the login page; once running, navigation is never
//! checked again.

use std::sync::Arc;
use thiserror::Error;

use crate::api::{ApiClient, ApiError, Pipeline, ReqwestTransport, Transport};
use crate::config::{Config, ConfigError};
use crate::router::{default_routes, RouteDef, RouteMatch, Router, RouterError, LOGIN_PATH};
use crate::storage::{FileStorage, KeyValueStorage, StorageError};
use crate::stores::{ServerAddress, Stores};

/// Bootstrap errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Routing error: {0}")]
    Router(#[from] RouterError),

    #[error("Client error: {0}")]
    Api(#[from] ApiError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// What a plugin can touch while it is being installed
pub struct InstallContext<'a> {
    pub stores: &'a Stores,
    pub router: &'a Router,
    /// Interceptors added here run after the standard ones
    pub pipeline: &'a mut Pipeline,
}

/// Extension installed once during bootstrap
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn install(&self, ctx: &mut InstallContext<'_>);
}

/// Collects everything the bootstrap sequence needs
pub struct AppBuilder {
    storage: Arc<dyn KeyValueStorage>,
    transport: Option<Arc<dyn Transport>>,
    plugins: Vec<Box<dyn Plugin>>,
    routes: Vec<RouteDef>,
    base_path: String,
    initial_location: String,
    server_defaults: ServerAddress,
}

impl AppBuilder {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            transport: None,
            plugins: Vec::new(),
            routes: default_routes(),
            base_path: "/".to_string(),
            initial_location: "/".to_string(),
            server_defaults: ServerAddress::default(),
        }
    }

    /// Transport for the API client; defaults to reqwest without a timeout
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn routes(mut self, routes: Vec<RouteDef>) -> Self {
        self.routes = routes;
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Location requested at startup, including the base path
    pub fn initial_location(mut self, location: impl Into<String>) -> Self {
        self.initial_location = location.into();
        self
    }

    pub fn server_defaults(mut self, defaults: ServerAddress) -> Self {
        self.server_defaults = defaults;
        self
    }

    /// Run the bootstrap sequence
    pub fn build(self) -> Result<App, AppError> {
        let stores = Stores::load_with_defaults(self.storage, self.server_defaults)?;
        let mut router = Router::new(self.routes).with_base(&self.base_path);

        let mut pipeline =
            Pipeline::standard(Arc::clone(&stores.auth), Arc::clone(&stores.settings));
        let mut installed = Vec::with_capacity(self.plugins.len());
        for plugin in &self.plugins {
            let mut ctx = InstallContext {
                stores: &stores,
                router: &router,
                pipeline: &mut pipeline,
            };
            plugin.install(&mut ctx);
            tracing::debug!(plugin = plugin.name(), "Installed plugin");
            installed.push(plugin.name().to_string());
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(None)?),
        };
        let client = ApiClient::with_pipeline(pipeline, transport);

        if stores.auth.is_authenticated() {
            let matched = router
                .resolve_location(&self.initial_location)
                .ok_or_else(|| RouterError::NoMatch(self.initial_location.clone()))?;
            router.push(&matched.path)?;
        } else {
            tracing::info!("No stored credential, redirecting to {}", LOGIN_PATH);
            router.push(LOGIN_PATH)?;
        }

        tracing::info!(
            server = %stores.settings.server_address(),
            location = router.current().map(|m| m.path.as_str()).unwrap_or(""),
            "Console started"
        );

        Ok(App {
            stores,
            router,
            client,
            plugins: installed,
        })
    }
}

/// A bootstrapped console
pub struct App {
    stores: Stores,
    router: Router,
    client: ApiClient,
    plugins: Vec<String>,
}

impl App {
    pub fn builder(storage: Arc<dyn KeyValueStorage>) -> AppBuilder {
        AppBuilder::new(storage)
    }

    /// Bootstrap from configuration: file storage and a reqwest transport
    pub fn from_config(config: &Config) -> Result<App, AppError> {
        let storage = FileStorage::open(&config.storage.path)?;
        let transport = ReqwestTransport::new(config.http.timeout())?;

        Self::builder(Arc::new(storage))
            .transport(Arc::new(transport))
            .base_path(config.router.base_path.clone())
            .server_defaults(config.server.address())
            .build()
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Names of installed plugins, in install order
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Current location; bootstrap always leaves one in place
    pub fn current(&self) -> Option<&RouteMatch> {
        self.router.current()
    }

    /// Navigate without any credential check
    pub fn navigate(&mut self, path: &str) -> Result<RouteMatch, RouterError> {
        self.router.push(path)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("stores", &self.stores)
            .field("location", &self.current().map(|m| &m.path))
            .field("plugins", &self.plugins)
            .finish()
    }
}
