//! Database layer - connection pool, migrations and repositories
//!
//! # Design Principles
//!
//! - Connection pool shared by all repositories
//! - Multi-statement writes run inside a scoped transaction
//! - Handlers talk to store traits, never to the pool

pub mod migrations;
pub mod pool;
pub mod repos;
pub mod tx;

pub use pool::{create_pool, create_pool_with_options, PoolConfig};
pub use repos::*;
