//! Schema migrations
//!
//! Every statement is idempotent so startup can run them unconditionally.

use sqlx::PgPool;

use crate::Result;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "buildings",
        r#"
        CREATE TABLE IF NOT EXISTS buildings (
            id UUID PRIMARY KEY,
            seq BIGSERIAL NOT NULL,
            doc JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "buildings_seq",
        "ALTER TABLE buildings ADD COLUMN IF NOT EXISTS seq BIGSERIAL NOT NULL",
    ),
    (
        "issues",
        r#"
        CREATE TABLE IF NOT EXISTS issues (
            issue_id SERIAL PRIMARY KEY,
            avoid_polygon TEXT,
            location TEXT,
            latitude DOUBLE PRECISION,
            longitude DOUBLE PRECISION,
            description TEXT,
            status TEXT,
            datetime_open TIMESTAMPTZ,
            datetime_closed TIMESTAMPTZ,
            datetime_permanent TIMESTAMPTZ,
            votes INTEGER NOT NULL DEFAULT 0
        )
        "#,
    ),
    (
        "issue_images",
        r#"
        CREATE TABLE IF NOT EXISTS issue_images (
            image_id SERIAL PRIMARY KEY,
            issue_id INTEGER NOT NULL REFERENCES issues(issue_id) ON DELETE CASCADE,
            image TEXT NOT NULL
        )
        "#,
    ),
    (
        "issue_categories",
        r#"
        CREATE TABLE IF NOT EXISTS issue_categories (
            issue_id INTEGER NOT NULL REFERENCES issues(issue_id) ON DELETE CASCADE,
            category TEXT NOT NULL,
            PRIMARY KEY (issue_id, category)
        )
        "#,
    ),
    (
        "issue_images_issue_idx",
        "CREATE INDEX IF NOT EXISTS issue_images_issue_idx ON issue_images (issue_id)",
    ),
    (
        "issue_categories_category_idx",
        "CREATE INDEX IF NOT EXISTS issue_categories_category_idx ON issue_categories (category)",
    ),
];

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<()> {
    tracing::info!("Running migrations...");

    for (name, sql) in STATEMENTS {
        tracing::debug!(migration = name, "applying");
        sqlx::query(sql).execute(pool).await?;
    }

    tracing::info!(count = STATEMENTS.len(), "Migrations complete");
    Ok(())
}
