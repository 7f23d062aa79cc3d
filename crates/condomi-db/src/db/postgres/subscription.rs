use async_trait::async_trait;
use chrono::{DateTime, Utc};
use condomi_core::billing::{self, RolloverPolicy};
use condomi_core::models::{Plan, ResourceKind, RolloverOutcome, Subscription};
use condomi_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::invoice::insert_invoice;
use super::{PLAN_COLUMNS, SUBSCRIPTION_COLUMNS};
use crate::db::store::SubscriptionStore;
use crate::db::transaction::TransactionGuard;

/// `(used column, capacity expression)` for a resource kind.
fn counter_columns(kind: ResourceKind) -> (&'static str, &'static str) {
    match kind {
        ResourceKind::Notification => ("notifications_used", "notifications_limit"),
        ResourceKind::Warning => ("warnings_used", "warnings_limit"),
        ResourceKind::Fine => ("fines_used", "fines_limit"),
        ResourceKind::PackageNotification => (
            "package_notifications_used",
            "package_notifications_limit + package_notifications_extra",
        ),
    }
}

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Explain why a conditional increment matched no row.
    async fn rejection(
        &self,
        condominium_id: Uuid,
        kind: ResourceKind,
        amount: i32,
        now: DateTime<Utc>,
    ) -> AppError {
        let subscription = match self.get_by_condominium(condominium_id).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => return AppError::NoSubscriptionFound { condominium_id },
            Err(e) => return e,
        };
        match billing::check_consumption(&subscription, kind, amount, now) {
            Err(e) => e,
            // Counters moved between the update and this read.
            Ok(()) => {
                let counter = subscription.counter(kind);
                AppError::QuotaExceeded {
                    resource: kind.to_string(),
                    used: counter.used,
                    requested: amount,
                    capacity: counter.capacity(),
                }
            }
        }
    }
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    async fn get_by_condominium(
        &self,
        condominium_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let row = sqlx::query_as::<Postgres, Subscription>(&format!(
            "SELECT {} FROM subscriptions WHERE condominium_id = $1",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(condominium_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "update", resource = %kind))]
    async fn try_consume(
        &self,
        condominium_id: Uuid,
        kind: ResourceKind,
        amount: i32,
        now: DateTime<Utc>,
    ) -> Result<Subscription, AppError> {
        if amount < 1 {
            return Err(AppError::InvalidInput("amount must be at least 1".to_string()));
        }
        let (used, capacity) = counter_columns(kind);

        // Check and increment in one statement so concurrent callers cannot
        // both take the last unit.
        let updated = sqlx::query_as::<Postgres, Subscription>(&format!(
            r#"
            UPDATE subscriptions
            SET {used} = {used} + $2, updated_at = NOW()
            WHERE condominium_id = $1
              AND is_active
              AND (is_lifetime OR (current_period_end >= $3 AND {used} + $2 <= {capacity}))
            RETURNING {columns}
            "#,
            used = used,
            capacity = capacity,
            columns = SUBSCRIPTION_COLUMNS
        ))
        .bind(condominium_id)
        .bind(amount)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(subscription) => Ok(subscription),
            None => Err(self.rejection(condominium_id, kind, amount, now).await),
        }
    }

    #[tracing::instrument(skip(self, policy), fields(db.table = "subscriptions", db.operation = "rollover"))]
    async fn rollover(
        &self,
        condominium_id: Uuid,
        now: DateTime<Utc>,
        policy: &RolloverPolicy,
    ) -> Result<RolloverOutcome, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "subscription_rollover").await?;

        let current = sqlx::query_as::<Postgres, Subscription>(&format!(
            "SELECT {} FROM subscriptions WHERE condominium_id = $1 FOR UPDATE",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(condominium_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::NoSubscriptionFound { condominium_id })?;

        let plan = sqlx::query_as::<Postgres, Plan>(&format!(
            "SELECT {} FROM plans WHERE tier = $1",
            PLAN_COLUMNS
        ))
        .bind(current.plan)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan '{}' not found", current.plan)))?;

        let Some(change) = billing::plan_rollover(&current, &plan, now, policy)? else {
            tx.rollback().await?;
            return Ok(RolloverOutcome {
                subscription: current,
                rolled_over: false,
                invoice: None,
            });
        };

        let subscription = sqlx::query_as::<Postgres, Subscription>(&format!(
            r#"
            UPDATE subscriptions
            SET current_period_start = $2,
                current_period_end = $3,
                notifications_limit = $4,
                warnings_limit = $5,
                fines_limit = $6,
                package_notifications_limit = $7,
                notifications_used = 0,
                warnings_used = 0,
                fines_used = 0,
                package_notifications_used = 0,
                updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(current.id)
        .bind(change.period.start)
        .bind(change.period.end)
        .bind(change.notifications_limit)
        .bind(change.warnings_limit)
        .bind(change.fines_limit)
        .bind(change.package_notifications_limit)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        let invoice = match change.invoice {
            Some(ref new_invoice) => Some(insert_invoice(&mut **tx, new_invoice).await?),
            None => None,
        };

        tx.commit().await?;

        tracing::info!(
            condominium_id = %condominium_id,
            months = change.period.months,
            period_end = %subscription.current_period_end,
            invoiced = invoice.is_some(),
            "Subscription period rolled over"
        );

        Ok(RolloverOutcome {
            subscription,
            rolled_over: true,
            invoice,
        })
    }
}
