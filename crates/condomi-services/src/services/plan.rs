use std::sync::Arc;

use condomi_core::models::{Plan, PlanTier, PlanUpdate};
use condomi_core::AppError;
use condomi_db::PlanStore;

/// Plan reference data. Edits apply to subscriptions at their next rollover.
#[derive(Clone)]
pub struct PlanService {
    plans: Arc<dyn PlanStore>,
}

impl PlanService {
    pub fn new(plans: Arc<dyn PlanStore>) -> Self {
        Self { plans }
    }

    pub async fn list_active(&self) -> Result<Vec<Plan>, AppError> {
        self.plans.list_active().await
    }

    #[tracing::instrument(skip(self, changes))]
    pub async fn update(&self, tier: PlanTier, changes: PlanUpdate) -> Result<Plan, AppError> {
        if changes.is_empty() {
            return Err(AppError::InvalidInput("No changes supplied".to_string()));
        }
        changes.validate().map_err(AppError::InvalidInput)?;

        self.plans
            .update(tier, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Plan '{}' not found", tier)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use condomi_db::MemoryStore;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_update_price_and_hide_plan() {
        let service = PlanService::new(Arc::new(MemoryStore::with_default_plans()));

        let plan = service
            .update(
                PlanTier::Start,
                PlanUpdate {
                    price: Some(Decimal::new(10990, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(plan.price, Decimal::new(10990, 2));
        assert_eq!(plan.notifications_limit, 10);

        service
            .update(
                PlanTier::Enterprise,
                PlanUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let tiers: Vec<PlanTier> = service
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.tier)
            .collect();
        assert_eq!(tiers.len(), 3);
        assert!(!tiers.contains(&PlanTier::Enterprise));
    }

    #[tokio::test]
    async fn test_rejects_empty_and_negative_updates() {
        let service = PlanService::new(Arc::new(MemoryStore::with_default_plans()));
        assert!(matches!(
            service.update(PlanTier::Start, PlanUpdate::default()).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            service
                .update(
                    PlanTier::Start,
                    PlanUpdate {
                        fines_limit: Some(-1),
                        ..Default::default()
                    }
                )
                .await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_tier_not_found() {
        let service = PlanService::new(Arc::new(MemoryStore::new()));
        let err = service
            .update(
                PlanTier::Start,
                PlanUpdate {
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
