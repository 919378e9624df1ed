//! Schema migration command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use indoormap_server::db::{create_pool_with_options, migrations};

use crate::config::Settings;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Extra settings file, applied over indoormap.toml
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

/// Create the tables and indexes, then exit
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(url) = args.database_url {
        settings.database.url = Some(url);
    }

    let pool = create_pool_with_options(settings.database_url()?, &settings.pool_config())
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    println!("✅ Schema is up to date");
    Ok(())
}
