//! HTTP server command
//!
//! Runs the building and indoor issue API against PostgreSQL, or against
//! the in-memory store with `--memory`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use indoormap_server::db::{create_pool_with_options, migrations, MemoryStore};
use indoormap_server::{run_server, AppState};

use crate::config::Settings;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// IP address to bind to (default: 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (default: 5000)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Keep data in memory instead of PostgreSQL (lost on exit, ignores --database-url)
    #[arg(long)]
    pub memory: bool,

    /// Extra settings file, applied over indoormap.toml
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl ServeArgs {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if self.cors_permissive {
            settings.server.cors_permissive = true;
        }
        if let Some(url) = &self.database_url {
            settings.database.url = Some(url.clone());
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply_to(&mut settings);
    let config = settings.server_config()?;

    let state = if args.memory {
        tracing::warn!("Using in-memory store, data is lost on shutdown");
        AppState::in_memory(Arc::new(MemoryStore::new()))
    } else {
        let pool = create_pool_with_options(settings.database_url()?, &settings.pool_config())
            .await
            .context("Failed to create database pool")?;

        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;

        AppState::postgres(pool)
    };

    tracing::info!("Starting indoormap server on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(state, config).await.context("Server error")?;

    Ok(())
}
