//! indoormap-server: HTTP server for buildings and indoor issues
//!
//! Buildings are schema-less documents kept in a JSONB table. Indoor issues
//! are relational rows with an optional base64 image and category tags.
//! Both live behind store traits so the router can run against PostgreSQL
//! or the in-memory store.

pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod state;

pub use error::{Error, Result};
pub use http::{build_router, run_server, ServerConfig};
pub use state::AppState;
