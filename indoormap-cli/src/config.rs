//! Layered settings for the indoormap binary
//!
//! Priority order (highest to lowest):
//! 1. Command-line flags
//! 2. Environment (`DATABASE_URL`, `INDOORMAP_HOST`, `INDOORMAP_PORT`), .env files included
//! 3. ./indoormap.toml
//! 4. ~/.indoormap/config.toml
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indoormap_server::db::PoolConfig;
use indoormap_server::ServerConfig;
use serde::Deserialize;
use tracing::{debug, info};

/// Project-local settings file name
pub const PROJECT_FILE: &str = "indoormap.toml";

/// Get the indoormap config directory path (~/.indoormap)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".indoormap"))
}

/// Load environment variables from .env files
///
/// The current directory is read first, then ~/.indoormap/.env. dotenvy
/// never overwrites a variable that is already set, so earlier files win.
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(path.display().to_string());
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => loaded_from.push(env_file.display().to_string()),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found (current dir or ~/.indoormap)");
    } else {
        info!("Loaded .env from: {}", loaded_from.join(", "));
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_permissive: bool,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            host: defaults.bind_addr.ip().to_string(),
            port: defaults.bind_addr.port(),
            cors_permissive: defaults.cors_permissive,
            request_timeout_secs: defaults.request_timeout.as_secs(),
            max_upload_bytes: defaults.max_body_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let defaults = PoolConfig::default();
        Self {
            url: None,
            max_connections: defaults.max_connections,
            acquire_timeout_secs: defaults.acquire_timeout.as_secs(),
        }
    }
}

/// Settings merged from every source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
}

impl Settings {
    /// Load from the default file locations and the process environment.
    pub fn load(extra: Option<&Path>) -> Result<Self> {
        let mut files: Vec<PathBuf> = config_dir()
            .map(|dir| dir.join("config.toml"))
            .into_iter()
            .collect();
        files.push(PathBuf::from(PROJECT_FILE));
        if let Some(path) = extra {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            files.push(path.to_path_buf());
        }

        let mut settings = Self::from_files(&files)?;
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Merge TOML files in order; later files override earlier ones key by key.
    /// Missing files are skipped.
    pub fn from_files(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = toml::Table::new();

        for path in paths.iter().filter(|p| p.exists()) {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let table: toml::Table = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file (invalid TOML): {}", path.display()))?;
            debug!("Loaded settings from {}", path.display());
            merge_tables(&mut merged, table);
        }

        toml::Value::Table(merged)
            .try_into()
            .context("Invalid settings")
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(host) = lookup("INDOORMAP_HOST").filter(|v| !v.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("INDOORMAP_PORT").filter(|v| !v.is_empty()) {
            self.server.port = port
                .parse()
                .with_context(|| format!("INDOORMAP_PORT is not a valid port: {port}"))?;
        }
        Ok(())
    }

    pub fn server_config(&self) -> Result<ServerConfig> {
        let bind_addr = ServerConfig::bind_addr_from(&self.server.host, self.server.port)
            .with_context(|| format!("server.host must be an IP address, got {}", self.server.host))?;

        Ok(ServerConfig {
            bind_addr,
            cors_permissive: self.server.cors_permissive,
            request_timeout: Duration::from_secs(self.server.request_timeout_secs),
            max_body_bytes: self.server.max_upload_bytes,
        })
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.database.max_connections,
            acquire_timeout: Duration::from_secs(self.database.acquire_timeout_secs),
        }
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database.url.as_deref().context(
            "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, \
             [database] url in indoormap.toml, or ~/.indoormap/.env",
        )
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
