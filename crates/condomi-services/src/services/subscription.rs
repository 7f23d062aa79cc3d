//! Condominium onboarding and billing-period rollover

use std::sync::Arc;

use condomi_core::billing::RolloverPolicy;
use condomi_core::models::{
    Condominium, PlanTier, RolloverOutcome, Subscription, SubscriptionOptions,
};
use condomi_core::AppError;
use condomi_db::{CondominiumStore, SubscriptionStore};
use uuid::Uuid;

use super::clock::Clock;

const MAX_NAME_LENGTH: usize = 200;

#[derive(Clone)]
pub struct SubscriptionService {
    condominiums: Arc<dyn CondominiumStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    policy: RolloverPolicy,
    clock: Arc<dyn Clock>,
}

impl SubscriptionService {
    pub fn new(
        condominiums: Arc<dyn CondominiumStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        policy: RolloverPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            condominiums,
            subscriptions,
            policy,
            clock,
        }
    }

    /// Create a condominium with its subscription on `tier`, starting now.
    #[tracing::instrument(skip(self, options))]
    pub async fn create_condominium(
        &self,
        name: &str,
        tier: PlanTier,
        options: SubscriptionOptions,
    ) -> Result<(Condominium, Subscription), AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("name must not be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(AppError::InvalidInput(format!(
                "name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }

        self.condominiums
            .create_with_subscription(name, tier, &options, self.clock.now())
            .await
    }

    /// Close an expired period: advance it, reset the counters, refresh the
    /// limits from the plan and issue the period invoice.
    #[tracing::instrument(skip(self))]
    pub async fn rollover(&self, condominium_id: Uuid) -> Result<RolloverOutcome, AppError> {
        let outcome = self
            .subscriptions
            .rollover(condominium_id, self.clock.now(), &self.policy)
            .await?;
        if !outcome.rolled_over {
            tracing::debug!("Period still running; nothing to roll over");
        }
        Ok(outcome)
    }
}
