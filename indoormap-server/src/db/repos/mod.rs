//! Store traits and their implementations
//!
//! Handlers only see [`BuildingStore`] and [`IssueStore`]:
//! - PostgreSQL: [`BuildingRepo`], [`IssueRepo`]
//! - In-memory: [`MemoryStore`], same atomicity rules, used by tests and
//!   `serve --memory`

pub mod buildings;
pub mod issues;
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Building, BuildingDoc, CategoryFilter, ImageUpload, Issue, IssuePatch, NewIssue};

pub use buildings::BuildingRepo;
pub use issues::IssueRepo;
pub use memory::MemoryStore;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("{operation} failed: {source}")]
    WriteFailed {
        operation: &'static str,
        #[source]
        source: Box<DbError>,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("stored building {id} is not a JSON object")]
    CorruptDocument { id: Uuid },
}

impl DbError {
    pub fn write_failed(operation: &'static str, source: DbError) -> Self {
        Self::WriteFailed {
            operation,
            source: Box::new(source),
        }
    }
}

/// Document store for buildings
#[async_trait]
pub trait BuildingStore: Send + Sync {
    /// Cheap round trip proving the store answers.
    async fn ping(&self) -> Result<(), DbError>;

    /// All buildings, oldest first.
    async fn list(&self) -> Result<Vec<Building>, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Building>, DbError>;

    async fn create(&self, doc: BuildingDoc) -> Result<Building, DbError>;

    /// Insert every document or none of them.
    async fn create_many(&self, docs: Vec<BuildingDoc>) -> Result<Vec<Building>, DbError>;

    /// Merge `patch` into the stored document (`$set` semantics).
    async fn update(&self, id: Uuid, patch: BuildingDoc) -> Result<Option<Building>, DbError>;

    /// Remove and return the document, `None` when nothing matched.
    async fn delete(&self, id: Uuid) -> Result<Option<Building>, DbError>;
}

/// Relational store for indoor issues
#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn ping(&self) -> Result<(), DbError>;

    async fn list(&self) -> Result<Vec<Issue>, DbError>;

    /// Issues tagged with any of the categories. An issue matching several
    /// categories appears once per match.
    async fn list_by_categories(&self, filter: &CategoryFilter) -> Result<Vec<Issue>, DbError>;

    async fn get(&self, id: i32) -> Result<Option<Issue>, DbError>;

    /// Insert the issue and, when given, its image in one transaction.
    async fn create(&self, issue: NewIssue, image: Option<ImageUpload>) -> Result<Issue, DbError>;

    /// Apply a non-empty patch. `None` when no row has this id.
    async fn update(&self, id: i32, patch: &IssuePatch) -> Result<Option<Issue>, DbError>;

    /// Remove the issue (and its images). `None` when no row has this id.
    async fn delete(&self, id: i32) -> Result<Option<Issue>, DbError>;
}
