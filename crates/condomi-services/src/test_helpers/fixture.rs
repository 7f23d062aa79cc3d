use chrono::{DateTime, Utc};
use condomi_core::models::{Condominium, PlanTier, Subscription};
use condomi_db::{CondominiumStore, MemoryStore};

/// Onboard a condominium on `tier` with default options.
pub async fn onboard(
    store: &MemoryStore,
    tier: PlanTier,
    now: DateTime<Utc>,
) -> (Condominium, Subscription) {
    store
        .create_with_subscription("Condomínio Teste", tier, &Default::default(), now)
        .await
        .unwrap()
}
