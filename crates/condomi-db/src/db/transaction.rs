//! Database transaction utilities
//!
//! Multi-statement writes (onboarding, rollover) go through these helpers so
//! they either commit as a whole or leave no trace.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;

use anyhow::Context;
use condomi_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};

/// An open transaction that must be committed explicitly.
///
/// Dropping the guard without calling [`TransactionGuard::commit`] rolls the
/// transaction back when the connection returns to the pool.
///
/// # Example
///
/// ```ignore
/// use condomi_db::TransactionGuard;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), condomi_core::AppError> {
///     let mut tx = TransactionGuard::begin(pool, "example").await?;
///     sqlx::query("UPDATE ...").execute(&mut **tx).await?;
///     tx.commit().await
/// }
/// ```
pub struct TransactionGuard {
    transaction: Transaction<'static, Postgres>,
    operation: &'static str,
}

impl TransactionGuard {
    /// Begin a new database transaction for `operation` (used in logs).
    pub async fn begin(pool: &PgPool, operation: &'static str) -> Result<Self, AppError> {
        let transaction = pool
            .begin()
            .await
            .with_context(|| format!("Failed to begin transaction for {}", operation))?;
        Ok(Self {
            transaction,
            operation,
        })
    }

    pub async fn commit(self) -> Result<(), AppError> {
        let operation = self.operation;
        self.transaction
            .commit()
            .await
            .with_context(|| format!("Failed to commit transaction for {}", operation))?;
        tracing::debug!(operation, "Transaction committed");
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), AppError> {
        let operation = self.operation;
        self.transaction
            .rollback()
            .await
            .with_context(|| format!("Failed to roll back transaction for {}", operation))?;
        tracing::debug!(operation, "Transaction rolled back");
        Ok(())
    }
}

impl Deref for TransactionGuard {
    type Target = Transaction<'static, Postgres>;

    fn deref(&self) -> &Self::Target {
        &self.transaction
    }
}

impl DerefMut for TransactionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.transaction
    }
}

/// Run `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
///
/// # Example
///
/// ```ignore
/// use condomi_db::with_transaction;
///
/// async fn example(pool: &sqlx::PgPool) -> Result<(), condomi_core::AppError> {
///     with_transaction(pool, |tx| Box::pin(async move {
///         sqlx::query("INSERT INTO ...").execute(&mut **tx).await?;
///         sqlx::query("UPDATE ...").execute(&mut **tx).await?;
///         Ok(())
///     })).await
/// }
/// ```
pub async fn with_transaction<F, R>(pool: &PgPool, f: F) -> Result<R, AppError>
where
    F: for<'a> FnOnce(
        &'a mut Transaction<'static, Postgres>,
    ) -> Pin<Box<dyn Future<Output = Result<R, AppError>> + Send + 'a>>,
{
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    match f(&mut tx).await {
        Ok(result) => {
            tx.commit().await.context("Failed to commit transaction")?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}
