//! Talos service binary.
//!
//! Loads the named configuration profile, applies command-line overrides,
//! registers the built-in routes, and runs the lifecycle until a stop
//! signal arrives.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use http_body_util::Full;
use tracing_subscriber::EnvFilter;

use talos_config::{TalosConfig, DEFAULT_LISTEN_ADDR};
use talos_core::handler_fn;
use talos_server::{HandlerRegistry, Lifecycle};

#[derive(Debug, Parser)]
#[command(name = "talos")]
#[command(about = "HTTP service lifecycle substrate", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration profile name, resolved to config/<profile>.json
    #[arg(short = 'c', long)]
    profile: String,

    /// Explicit configuration file path, overriding profile resolution
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, host:port
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Path to the PEM certificate chain (requires --key)
    #[arg(long)]
    cert: Option<PathBuf>,

    /// Path to the PEM private key (requires --cert)
    #[arg(long)]
    key: Option<PathBuf>,

    /// Enable debug-level logging
    #[arg(short = 'd', long)]
    debug: bool,
}

impl Cli {
    /// Loads the profile and layers the command-line overrides on top.
    fn resolve_config(&self) -> Result<TalosConfig, talos_config::ConfigError> {
        let mut config = TalosConfig::load_profile(&self.profile, self.config.as_deref())?;

        if self.listen != DEFAULT_LISTEN_ADDR {
            config.listen.clone_from(&self.listen);
        }
        if self.cert.is_some() {
            config.cert.clone_from(&self.cert);
        }
        if self.key.is_some() {
            config.key.clone_from(&self.key);
        }
        if self.debug {
            config.debug = true;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn built_in_routes() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.get("/health", "healthCheck", handler_fn(|_ctx, _req| async {
        http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(
                serde_json::json!({ "status": "ok" }).to_string(),
            )))
            .expect("failed to build health response")
    }));
    registry
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = cli
        .resolve_config()
        .with_context(|| format!("failed to load profile '{}'", cli.profile))?;

    tracing::info!(
        profile = %cli.profile,
        listen = %config.listen,
        tls = config.cert.is_some(),
        "configuration loaded"
    );

    Lifecycle::new(config, built_in_routes())
        .run()
        .await
        .context("service terminated abnormally")?;

    Ok(())
}
