//! Error types for indoormap-server startup

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while connecting, migrating or binding the server.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}
