//! Store traits
//!
//! Services depend on these traits only. Each operation that checks and then
//! writes is a single call so the implementation can make it atomic.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use condomi_core::billing::RolloverPolicy;
use condomi_core::models::{
    Condominium, Invoice, ListPreferences, NewInvoice, PaymentRecord, Plan, PlanTier, PlanUpdate,
    ResourceKind, Role, RolloverOutcome, Subscription, SubscriptionOptions,
};
use condomi_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use super::memory::MemoryStore;
use super::postgres::{
    AccessRepository, CondominiumRepository, InvoiceRepository, PlanRepository,
    SubscriptionRepository,
};

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Plan>, AppError>;

    async fn get_by_tier(&self, tier: PlanTier) -> Result<Option<Plan>, AppError>;

    /// Apply a partial update. `None` when the tier has no row.
    async fn update(&self, tier: PlanTier, changes: &PlanUpdate) -> Result<Option<Plan>, AppError>;
}

#[async_trait]
pub trait CondominiumStore: Send + Sync {
    /// Insert a condominium and its subscription together; neither row exists
    /// if either insert fails.
    async fn create_with_subscription(
        &self,
        name: &str,
        tier: PlanTier,
        options: &SubscriptionOptions,
        now: DateTime<Utc>,
    ) -> Result<(Condominium, Subscription), AppError>;

    async fn get(&self, condominium_id: Uuid) -> Result<Option<Condominium>, AppError>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get_by_condominium(
        &self,
        condominium_id: Uuid,
    ) -> Result<Option<Subscription>, AppError>;

    /// Add `amount` to the `kind` counter if, and only if, it still fits.
    ///
    /// On rejection nothing is written and the error says why:
    /// `NoSubscriptionFound`, `SubscriptionInactive`, `PeriodExpired` or
    /// `QuotaExceeded`.
    async fn try_consume(
        &self,
        condominium_id: Uuid,
        kind: ResourceKind,
        amount: i32,
        now: DateTime<Utc>,
    ) -> Result<Subscription, AppError>;

    /// Advance an expired period, reset counters and issue the period
    /// invoice, all in one unit of work.
    async fn rollover(
        &self,
        condominium_id: Uuid,
        now: DateTime<Utc>,
        policy: &RolloverPolicy,
    ) -> Result<RolloverOutcome, AppError>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert(&self, invoice: NewInvoice) -> Result<Invoice, AppError>;

    async fn get(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError>;

    /// `pending -> paid`. A paid invoice yields `AlreadyPaid` and is left as is.
    async fn mark_paid(&self, invoice_id: Uuid, payment: &PaymentRecord)
        -> Result<Invoice, AppError>;

    /// All invoices, or those of one condominium, in the requested order.
    async fn list(
        &self,
        condominium_id: Option<Uuid>,
        preferences: ListPreferences,
    ) -> Result<Vec<Invoice>, AppError>;
}

/// Role lookups backing authorization.
#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn get_user_condominium_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    /// Whether the user holds `role`, optionally scoped to one condominium.
    async fn has_role(
        &self,
        user_id: Uuid,
        role: Role,
        condominium_id: Option<Uuid>,
    ) -> Result<bool, AppError>;
}

/// Every store a service may need, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub plans: Arc<dyn PlanStore>,
    pub condominiums: Arc<dyn CondominiumStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub access: Arc<dyn AccessStore>,
    pool: Option<PgPool>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            plans: Arc::new(PlanRepository::new(pool.clone())),
            condominiums: Arc::new(CondominiumRepository::new(pool.clone())),
            subscriptions: Arc::new(SubscriptionRepository::new(pool.clone())),
            invoices: Arc::new(InvoiceRepository::new(pool.clone())),
            access: Arc::new(AccessRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            plans: store.clone(),
            condominiums: store.clone(),
            subscriptions: store.clone(),
            invoices: store.clone(),
            access: store,
            pool: None,
        }
    }

    /// Round-trip to the database, if there is one.
    pub async fn ping(&self) -> Result<(), AppError> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
