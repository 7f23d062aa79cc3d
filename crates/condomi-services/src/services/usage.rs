//! Usage-limit enforcement
//!
//! Every notification, warning, fine and package notification a
//! condominium sends is metered against its subscription. The check and the
//! increment happen inside one store call.

use std::sync::Arc;

use condomi_core::models::{ResourceKind, UsageReceipt, UsageSummary};
use condomi_core::AppError;
use condomi_db::SubscriptionStore;
use uuid::Uuid;

use super::clock::Clock;

#[derive(Clone)]
pub struct UsageLimitService {
    subscriptions: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
}

impl UsageLimitService {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            subscriptions,
            clock,
        }
    }

    /// Consume `amount` units of `kind` from the condominium's allotment.
    ///
    /// Lifetime subscriptions are counted but never rejected for quota or
    /// period reasons.
    #[tracing::instrument(skip(self), fields(condominium_id = %condominium_id, resource = %kind))]
    pub async fn consume(
        &self,
        condominium_id: Uuid,
        kind: ResourceKind,
        amount: i32,
    ) -> Result<UsageReceipt, AppError> {
        if amount < 1 {
            return Err(AppError::InvalidInput(
                "amount must be at least 1".to_string(),
            ));
        }

        let now = self.clock.now();
        let subscription = match self
            .subscriptions
            .try_consume(condominium_id, kind, amount, now)
            .await
        {
            Ok(subscription) => subscription,
            Err(e) => {
                if matches!(e, AppError::QuotaExceeded { .. }) {
                    tracing::warn!(error = %e, "Usage rejected");
                }
                return Err(e);
            }
        };

        let receipt = UsageReceipt::from_subscription(&subscription, kind);
        tracing::debug!(
            used = receipt.used,
            remaining = receipt.remaining,
            unmetered = receipt.unmetered,
            "Usage recorded"
        );
        Ok(receipt)
    }

    /// Consume a single unit.
    pub async fn consume_one(
        &self,
        condominium_id: Uuid,
        kind: ResourceKind,
    ) -> Result<UsageReceipt, AppError> {
        self.consume(condominium_id, kind, 1).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn usage_summary(&self, condominium_id: Uuid) -> Result<UsageSummary, AppError> {
        let subscription = self
            .subscriptions
            .get_by_condominium(condominium_id)
            .await?
            .ok_or(AppError::NoSubscriptionFound { condominium_id })?;
        Ok(UsageSummary::from(&subscription))
    }
}
