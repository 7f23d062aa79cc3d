use async_trait::async_trait;
use condomi_core::models::{Plan, PlanTier, PlanUpdate};
use condomi_core::AppError;
use sqlx::{PgPool, Postgres};

use super::PLAN_COLUMNS;
use crate::db::store::PlanStore;

#[derive(Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PlanRepository {
    #[tracing::instrument(skip(self), fields(db.table = "plans", db.operation = "select_list"))]
    async fn list_active(&self) -> Result<Vec<Plan>, AppError> {
        let plans = sqlx::query_as::<Postgres, Plan>(&format!(
            "SELECT {} FROM plans WHERE is_active ORDER BY price ASC",
            PLAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }

    #[tracing::instrument(skip(self), fields(db.table = "plans", db.operation = "select"))]
    async fn get_by_tier(&self, tier: PlanTier) -> Result<Option<Plan>, AppError> {
        let plan = sqlx::query_as::<Postgres, Plan>(&format!(
            "SELECT {} FROM plans WHERE tier = $1",
            PLAN_COLUMNS
        ))
        .bind(tier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    #[tracing::instrument(skip(self, changes), fields(db.table = "plans", db.operation = "update"))]
    async fn update(&self, tier: PlanTier, changes: &PlanUpdate) -> Result<Option<Plan>, AppError> {
        let plan = sqlx::query_as::<Postgres, Plan>(&format!(
            r#"
            UPDATE plans
            SET name = COALESCE($2, name),
                notifications_limit = COALESCE($3, notifications_limit),
                warnings_limit = COALESCE($4, warnings_limit),
                fines_limit = COALESCE($5, fines_limit),
                package_notifications_limit = COALESCE($6, package_notifications_limit),
                price = COALESCE($7, price),
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
            WHERE tier = $1
            RETURNING {}
            "#,
            PLAN_COLUMNS
        ))
        .bind(tier)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.notifications_limit)
        .bind(changes.warnings_limit)
        .bind(changes.fines_limit)
        .bind(changes.package_notifications_limit)
        .bind(changes.price)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref plan) = plan {
            tracing::info!(tier = %plan.tier, "Plan updated");
        }
        Ok(plan)
    }
}
