//! Building repository
//!
//! Buildings are stored as JSONB documents:
//! - update: `doc || patch` merges named attributes
//! - create_many: one transaction, all or nothing

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{BuildingStore, DbError};
use crate::db::tx::in_transaction;
use crate::models::{Building, BuildingDoc};

#[derive(FromRow)]
struct BuildingRow {
    id: Uuid,
    doc: Value,
}

impl TryFrom<BuildingRow> for Building {
    type Error = DbError;

    fn try_from(row: BuildingRow) -> Result<Self, DbError> {
        let id = row.id;
        Building::from_stored(id, row.doc).map_err(|_| DbError::CorruptDocument { id })
    }
}

/// Building repository
#[derive(Clone)]
pub struct BuildingRepo {
    pool: PgPool,
}

impl BuildingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BuildingStore for BuildingRepo {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Building>, DbError> {
        let rows: Vec<BuildingRow> =
            sqlx::query_as("SELECT id, doc FROM buildings ORDER BY seq")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Building::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Building>, DbError> {
        let row: Option<BuildingRow> = sqlx::query_as("SELECT id, doc FROM buildings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Building::try_from).transpose()
    }

    async fn create(&self, doc: BuildingDoc) -> Result<Building, DbError> {
        let row: BuildingRow = sqlx::query_as(
            "INSERT INTO buildings (id, doc) VALUES ($1, $2) RETURNING id, doc",
        )
        .bind(Uuid::new_v4())
        .bind(doc.into_value())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn create_many(&self, docs: Vec<BuildingDoc>) -> Result<Vec<Building>, DbError> {
        in_transaction(&self.pool, "insert buildings", move |conn| {
            Box::pin(async move {
                let mut created = Vec::with_capacity(docs.len());
                for doc in docs {
                    let row: BuildingRow = sqlx::query_as(
                        "INSERT INTO buildings (id, doc) VALUES ($1, $2) RETURNING id, doc",
                    )
                    .bind(Uuid::new_v4())
                    .bind(doc.into_value())
                    .fetch_one(&mut *conn)
                    .await?;
                    created.push(Building::try_from(row)?);
                }
                Ok::<_, DbError>(created)
            })
        })
        .await
    }

    async fn update(&self, id: Uuid, patch: BuildingDoc) -> Result<Option<Building>, DbError> {
        let row: Option<BuildingRow> = sqlx::query_as(
            r#"
            UPDATE buildings
            SET doc = doc || $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, doc
            "#,
        )
        .bind(id)
        .bind(patch.into_value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Building::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Building>, DbError> {
        let row: Option<BuildingRow> =
            sqlx::query_as("DELETE FROM buildings WHERE id = $1 RETURNING id, doc")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Building::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn corrupt_row_is_reported_with_its_id() {
        let id = Uuid::new_v4();
        let row = BuildingRow {
            id,
            doc: json!("not an object"),
        };

        let err = Building::try_from(row).unwrap_err();
        assert!(matches!(err, DbError::CorruptDocument { id: bad } if bad == id));
    }

    // Integration tests - run with DATABASE_URL set
    // cargo test -p indoormap-server -- --ignored

    async fn repo() -> BuildingRepo {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");
        BuildingRepo::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_merges_attributes() {
        let repo = repo().await;
        let created = repo
            .create(BuildingDoc::new(json!({"name": "Hall", "floors": 2})).unwrap())
            .await
            .unwrap();

        let updated = repo
            .update(created.id, BuildingDoc::new(json!({"floors": 3})).unwrap())
            .await
            .unwrap()
            .expect("building exists");

        assert_eq!(updated.doc.into_value(), json!({"name": "Hall", "floors": 3}));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn bulk_insert_lists_in_insertion_order() {
        let repo = repo().await;
        let names: Vec<String> = (0..20).map(|i| format!("bulk-{}-{}", Uuid::new_v4(), i)).collect();
        let docs = names
            .iter()
            .map(|name| BuildingDoc::new(json!({"name": name})).unwrap())
            .collect();

        repo.create_many(docs).await.unwrap();

        let listed: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|b| b.doc.fields().get("name").and_then(Value::as_str).map(str::to_owned))
            .filter(|name| names.contains(name))
            .collect();
        assert_eq!(listed, names);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_then_get_is_none() {
        let repo = repo().await;
        let created = repo
            .create(BuildingDoc::new(json!({"name": "Annex"})).unwrap())
            .await
            .unwrap();

        let deleted = repo.delete(created.id).await.unwrap();
        assert_eq!(deleted, Some(created.clone()));
        assert_eq!(repo.get(created.id).await.unwrap(), None);
        assert_eq!(repo.delete(created.id).await.unwrap(), None);
    }
}
