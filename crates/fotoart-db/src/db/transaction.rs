//! Database transaction utilities
//!
//! Multi-statement operations (publish, unpublish, applying a payment) run
//! through [`with_transaction`] so that either every write lands or none does.

use fotoart_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use std::future::Future;
use std::pin::Pin;

/// Boxed future borrowing the open transaction
pub type TxFuture<'c, R> = Pin<Box<dyn Future<Output = Result<R, AppError>> + Send + 'c>>;

/// Execute a closure within a database transaction
///
/// Commits when the closure returns `Ok`, rolls back on `Err` and hands the
/// error back unchanged. Returning an error is also how a closure asks for a
/// rollback after a zero-row update.
///
/// # Example
///
/// ```ignore
/// use fotoart_db::with_transaction;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), fotoart_core::AppError> {
///     with_transaction(pool, |tx| {
///         Box::pin(async move {
///             sqlx::query("UPDATE ...").execute(&mut **tx).await?;
///             sqlx::query("DELETE ...").execute(&mut **tx).await?;
///             Ok(())
///         })
///     })
///     .await
/// }
/// ```
pub async fn with_transaction<F, R>(pool: &PgPool, f: F) -> Result<R, AppError>
where
    F: for<'c> FnOnce(&'c mut Transaction<'static, Postgres>) -> TxFuture<'c, R>,
{
    let mut tx = pool.begin().await?;

    match f(&mut tx).await {
        Ok(result) => {
            tx.commit().await?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(e)
        }
    }
}
