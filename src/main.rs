//! Admin Console CLI
//!
//! Command-line front end for the console:
//! - Store or clear the login credential
//! - Show or change the backend server address
//! - Issue authenticated calls against the backend
//! - Inspect the route table

use admin_console::{generate_default_config, App, Config, LoggingConfig, OutgoingRequest};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use reqwest::Method;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "admin-console")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Client shell for the remote administration dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage file holding the token and server address
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a bearer credential
    Login {
        /// Token issued by the backend
        token: String,
    },

    /// Clear the stored credential
    Logout,

    /// Show or set the backend server address
    Server {
        /// Server host
        #[arg(requires = "port")]
        host: Option<String>,
        /// Server port
        port: Option<u16>,
    },

    /// Show credential, server and startup location
    Status,

    /// Issue a call through the authenticated client
    Request {
        /// HTTP method (GET, POST, PUT, DELETE, ...)
        method: String,
        /// Path relative to the server, or an absolute URL
        path: String,
        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
        /// Query parameters in key=value format
        #[arg(short, long)]
        query: Vec<String>,
    },

    /// Resolve a path against the route table (no path: list routes)
    Route {
        path: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("admin_console={}", config.level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        // No subscriber yet: a broken file is an error, not a warning
        None => match Config::default_path() {
            Some(path) => Config::load_with_env(&path)
                .with_context(|| format!("failed to load config from {:?}", path))?,
            None => Config::from_env(),
        },
    };
    if let Some(storage) = &cli.storage {
        config.storage.path = storage.to_string_lossy().to_string();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_logging(&config.logging);

    let app = App::from_config(&config).context("failed to start console")?;
    let json = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Login { token } => {
            app.stores().auth.set_token(token)?;
            println!("Credential stored");
        }

        Commands::Logout => {
            app.stores().auth.logout()?;
            println!("Credential cleared");
        }

        Commands::Server { host, port } => {
            if let (Some(host), Some(port)) = (host, port) {
                app.stores().settings.set_server(host, port)?;
            }
            let address = app.stores().settings.server_address();
            if json {
                println!("{}", serde_json::to_string_pretty(&address)?);
            } else {
                println!("Server: {}", address.base_url());
            }
        }

        Commands::Status => {
            let address = app.stores().settings.server_address();
            let authenticated = app.stores().auth.is_authenticated();
            let location = app.current().map(|m| m.path.clone()).unwrap_or_default();

            if json {
                let status = serde_json::json!({
                    "version": env!("CARGO_PKG_VERSION"),
                    "server": address,
                    "authenticated": authenticated,
                    "location": location,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("Admin Console v{}", env!("CARGO_PKG_VERSION"));
                println!();
                println!("Server:        {}", address.base_url());
                println!(
                    "Credential:    {}",
                    if authenticated { "stored" } else { "none" }
                );
                println!("Start page:    {}", location);
            }
        }

        Commands::Request {
            method,
            path,
            data,
            query,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method: {}", method))?;

            let mut request = OutgoingRequest::new(method, path);
            for pair in query {
                match pair.split_once('=') {
                    Some((k, v)) => request = request.query(k, v),
                    None => anyhow::bail!("query parameter must be key=value: {}", pair),
                }
            }
            if let Some(data) = data {
                let body: serde_json::Value =
                    serde_json::from_str(&data).context("request body is not valid JSON")?;
                request = request.json(&body)?;
            }

            match app.client().send(request).await {
                Ok(response) => {
                    let text = response.text();
                    match serde_json::from_str::<serde_json::Value>(&text) {
                        Ok(value) if json => println!("{}", serde_json::to_string_pretty(&value)?),
                        _ => println!("{}", text),
                    }
                }
                Err(e) if e.is_unauthorized() => {
                    eprintln!("{}", e);
                    eprintln!("Credential rejected; stored token cleared. Run `admin-console login`.");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Route { path } => match path {
            Some(path) => match app.router().resolve(&path) {
                Some(matched) if json => println!("{}", serde_json::to_string_pretty(&matched)?),
                Some(matched) => {
                    let pages: Vec<&str> = matched.pages.iter().map(|p| p.as_str()).collect();
                    println!("{} ({})", matched.name, matched.pattern);
                    println!("  pages:  {}", pages.join(" > "));
                    for (k, v) in &matched.params {
                        println!("  {}: {}", k, v);
                    }
                }
                None => {
                    eprintln!("No route matches {}", path);
                    std::process::exit(1);
                }
            },
            None => {
                for entry in app.router().entries() {
                    let pages: Vec<&str> = entry.pages.iter().map(|p| p.as_str()).collect();
                    println!("{:<12} {:<12} {}", entry.name, entry.pattern, pages.join(" > "));
                }
            }
        },

        // Handled before bootstrap
        Commands::Config { .. } => {}
    }

    Ok(())
}
