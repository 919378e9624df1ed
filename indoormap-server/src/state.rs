//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use crate::db::repos::{BuildingRepo, BuildingStore, IssueRepo, IssueStore, MemoryStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub buildings: Arc<dyn BuildingStore>,
    pub issues: Arc<dyn IssueStore>,
}

impl AppState {
    /// State backed by PostgreSQL repositories sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            buildings: Arc::new(BuildingRepo::new(pool.clone())),
            issues: Arc::new(IssueRepo::new(pool)),
        }
    }

    /// State backed by a single in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            buildings: store.clone(),
            issues: store,
        }
    }
}
