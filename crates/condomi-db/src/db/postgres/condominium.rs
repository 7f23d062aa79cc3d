use async_trait::async_trait;
use chrono::{DateTime, Utc};
use condomi_core::billing;
use condomi_core::models::{Condominium, Plan, PlanTier, Subscription, SubscriptionOptions};
use condomi_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{PLAN_COLUMNS, SUBSCRIPTION_COLUMNS};
use crate::db::store::CondominiumStore;
use crate::db::transaction::with_transaction;

#[derive(Clone)]
pub struct CondominiumRepository {
    pool: PgPool,
}

impl CondominiumRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CondominiumStore for CondominiumRepository {
    #[tracing::instrument(skip(self, options), fields(db.table = "condominiums", db.operation = "insert"))]
    async fn create_with_subscription(
        &self,
        name: &str,
        tier: PlanTier,
        options: &SubscriptionOptions,
        now: DateTime<Utc>,
    ) -> Result<(Condominium, Subscription), AppError> {
        let name = name.trim().to_string();
        let options = options.clone();

        let (condominium, subscription) = with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let plan = sqlx::query_as::<Postgres, Plan>(&format!(
                    "SELECT {} FROM plans WHERE tier = $1 FOR SHARE",
                    PLAN_COLUMNS
                ))
                .bind(tier)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Plan '{}' not found", tier)))?;

                let condominium = sqlx::query_as::<Postgres, Condominium>(
                    r#"
                    INSERT INTO condominiums (id, name, created_at, updated_at)
                    VALUES ($1, $2, $3, $3)
                    RETURNING id, name, created_at, updated_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(&name)
                .bind(now)
                .fetch_one(&mut **tx)
                .await?;

                let draft = billing::new_subscription(condominium.id, &plan, &options, now)?;
                let subscription = sqlx::query_as::<Postgres, Subscription>(&format!(
                    r#"
                    INSERT INTO subscriptions (
                        id, condominium_id, plan, is_active, is_trial, trial_ends_at, is_lifetime,
                        current_period_start, current_period_end,
                        notifications_limit, notifications_used,
                        warnings_limit, warnings_used,
                        fines_limit, fines_used,
                        package_notifications_limit, package_notifications_extra,
                        package_notifications_used, created_at, updated_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $11, 0, $12, 0, $13, $14, 0, $15, $15)
                    RETURNING {}
                    "#,
                    SUBSCRIPTION_COLUMNS
                ))
                .bind(draft.id)
                .bind(draft.condominium_id)
                .bind(draft.plan)
                .bind(draft.is_active)
                .bind(draft.is_trial)
                .bind(draft.trial_ends_at)
                .bind(draft.is_lifetime)
                .bind(draft.current_period_start)
                .bind(draft.current_period_end)
                .bind(draft.notifications_limit)
                .bind(draft.warnings_limit)
                .bind(draft.fines_limit)
                .bind(draft.package_notifications_limit)
                .bind(draft.package_notifications_extra)
                .bind(now)
                .fetch_one(&mut **tx)
                .await?;

                Ok((condominium, subscription))
            })
        })
        .await?;

        tracing::info!(
            condominium_id = %condominium.id,
            plan = %subscription.plan,
            "Condominium onboarded"
        );
        Ok((condominium, subscription))
    }

    #[tracing::instrument(skip(self), fields(db.table = "condominiums", db.operation = "select"))]
    async fn get(&self, condominium_id: Uuid) -> Result<Option<Condominium>, AppError> {
        let row = sqlx::query_as::<Postgres, Condominium>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM condominiums
            WHERE id = $1
            "#,
        )
        .bind(condominium_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
