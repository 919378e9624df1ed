//! Scoped transactions
//!
//! `in_transaction` checks one connection out of the pool, runs the body on
//! it, commits on `Ok` and rolls back on `Err`. The connection goes back to
//! the pool on every exit path, including a panic in the body (sqlx rolls an
//! unfinished transaction back on drop).

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};

use super::repos::DbError;

/// Run `body` inside a transaction on a dedicated connection.
///
/// A failing body is rolled back and reported as
/// [`DbError::WriteFailed`] naming `operation`.
///
/// # Example
///
/// ```ignore
/// let id = in_transaction(&pool, "create issue", |conn| {
///     Box::pin(async move {
///         let (id,): (i32,) = sqlx::query_as("INSERT ... RETURNING issue_id")
///             .fetch_one(&mut *conn)
///             .await?;
///         Ok(id)
///     })
/// })
/// .await?;
/// ```
pub async fn in_transaction<T, F>(
    pool: &PgPool,
    operation: &'static str,
    body: F,
) -> Result<T, DbError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, DbError>> + Send,
{
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::write_failed(operation, e.into()))?;

    match body(&mut *tx).await {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| DbError::write_failed(operation, e.into()))?;
            tracing::debug!(operation, "transaction committed");
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(operation, error = %err, "rolling back transaction");
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(operation, error = %rollback_err, "rollback failed");
            }
            Err(DbError::write_failed(operation, err))
        }
    }
}
