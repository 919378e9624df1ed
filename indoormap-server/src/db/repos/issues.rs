//! Indoor issue repository
//!
//! - create: issue + optional image in one scoped transaction
//! - list_by_categories: positional IN-clause over the category join
//! - update: SET clause built from the allow-listed patch columns

use async_trait::async_trait;
use sqlx::PgPool;

use super::{DbError, IssueStore};
use crate::db::tx::in_transaction;
use crate::models::{CategoryFilter, ImageUpload, Issue, IssueImage, IssuePatch, IssueValue, NewIssue};

const INSERT_ISSUE: &str = r#"
    INSERT INTO issues (
        avoid_polygon, location, latitude, longitude, description, status,
        datetime_open, datetime_closed, datetime_permanent, votes
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    RETURNING *
"#;

const INSERT_IMAGE: &str = "INSERT INTO issue_images (issue_id, image) VALUES ($1, $2)";

/// `SELECT` joining issues to categories with `count` placeholders.
///
/// Callers guarantee `count > 0` (see [`CategoryFilter`]).
fn category_filter_sql(count: usize) -> String {
    let placeholders = (1..=count)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT issues.* FROM issues \
         JOIN issue_categories ON issues.issue_id = issue_categories.issue_id \
         WHERE issue_categories.category IN ({})",
        placeholders
    )
}

/// `UPDATE` with one assignment per column; `$1` is the issue id.
///
/// Column names only ever come from [`IssuePatch::assignments`].
fn update_sql(columns: &[&str]) -> String {
    let set_clause = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 2))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "UPDATE issues SET {} WHERE issue_id = $1 RETURNING *",
        set_clause
    )
}

/// Issue repository
#[derive(Clone)]
pub struct IssueRepo {
    pool: PgPool,
}

impl IssueRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Images stored for an issue.
    pub async fn images_for(&self, issue_id: i32) -> Result<Vec<IssueImage>, DbError> {
        let images = sqlx::query_as(
            "SELECT image_id, issue_id, image FROM issue_images WHERE issue_id = $1 ORDER BY image_id",
        )
        .bind(issue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }
}

#[async_trait]
impl IssueStore for IssueRepo {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Issue>, DbError> {
        let issues = sqlx::query_as("SELECT * FROM issues ORDER BY issue_id")
            .fetch_all(&self.pool)
            .await?;

        Ok(issues)
    }

    async fn list_by_categories(&self, filter: &CategoryFilter) -> Result<Vec<Issue>, DbError> {
        let sql = category_filter_sql(filter.len());

        let mut query = sqlx::query_as::<_, Issue>(&sql);
        for category in filter.as_slice() {
            query = query.bind(category);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: i32) -> Result<Option<Issue>, DbError> {
        let issue = sqlx::query_as("SELECT * FROM issues WHERE issue_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(issue)
    }

    async fn create(&self, issue: NewIssue, image: Option<ImageUpload>) -> Result<Issue, DbError> {
        let created = in_transaction(&self.pool, "create issue", move |conn| {
            Box::pin(async move {
                let created: Issue = sqlx::query_as(INSERT_ISSUE)
                    .bind(issue.avoid_polygon)
                    .bind(issue.location)
                    .bind(issue.latitude)
                    .bind(issue.longitude)
                    .bind(issue.description)
                    .bind(issue.status)
                    .bind(issue.datetime_open)
                    .bind(issue.datetime_closed)
                    .bind(issue.datetime_permanent)
                    .bind(issue.votes)
                    .fetch_one(&mut *conn)
                    .await?;

                if let Some(image) = image {
                    sqlx::query(INSERT_IMAGE)
                        .bind(created.issue_id)
                        .bind(image.to_base64())
                        .execute(&mut *conn)
                        .await?;
                }

                Ok::<_, DbError>(created)
            })
        })
        .await?;

        tracing::info!(issue_id = created.issue_id, "issue created");
        Ok(created)
    }

    async fn update(&self, id: i32, patch: &IssuePatch) -> Result<Option<Issue>, DbError> {
        let assignments = patch.assignments();
        let columns: Vec<&str> = assignments.iter().map(|(column, _)| *column).collect();
        let sql = update_sql(&columns);

        let mut query = sqlx::query_as::<_, Issue>(&sql).bind(id);
        for (_, value) in assignments {
            query = match value {
                IssueValue::Text(v) => query.bind(v),
                IssueValue::Float(v) => query.bind(v),
                IssueValue::Timestamp(v) => query.bind(v),
                IssueValue::Integer(v) => query.bind(v),
            };
        }

        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn delete(&self, id: i32) -> Result<Option<Issue>, DbError> {
        let issue = sqlx::query_as("DELETE FROM issues WHERE issue_id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(issue)
    }
}
