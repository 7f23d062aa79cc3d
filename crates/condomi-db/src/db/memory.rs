//! In-memory store
//!
//! Implements every store trait over one mutex-guarded state. Each trait
//! call takes the lock once, so a check and the write it guards can never
//! interleave with another call. Used by the test suites and for running
//! the API without PostgreSQL.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use condomi_core::billing::{self, RolloverPolicy};
use condomi_core::models::{
    Condominium, Invoice, InvoiceSortField, InvoiceStatus, ListPreferences, NewInvoice,
    PaymentRecord, Plan, PlanTier, PlanUpdate, ResourceKind, Role, RolloverOutcome, SortDirection,
    Subscription, SubscriptionOptions,
};
use condomi_core::AppError;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::store::{AccessStore, CondominiumStore, InvoiceStore, PlanStore, SubscriptionStore};

#[derive(Debug, Clone)]
struct RoleGrant {
    user_id: Uuid,
    role: Role,
    condominium_id: Option<Uuid>,
}

#[derive(Default)]
struct MemoryState {
    plans: HashMap<PlanTier, Plan>,
    condominiums: HashMap<Uuid, Condominium>,
    /// Keyed by condominium id.
    subscriptions: HashMap<Uuid, Subscription>,
    invoices: HashMap<Uuid, Invoice>,
    grants: Vec<RoleGrant>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the four standard plans.
    pub fn with_default_plans() -> Self {
        let store = Self::new();
        let now = Utc::now();
        let defaults = [
            (PlanTier::Start, "Start", 10, 10, 5, 50, Decimal::new(9990, 2)),
            (PlanTier::Essencial, "Essencial", 50, 30, 20, 200, Decimal::new(14990, 2)),
            (PlanTier::Profissional, "Profissional", 200, 100, 50, 1000, Decimal::new(24990, 2)),
            (PlanTier::Enterprise, "Enterprise", 1000, 500, 200, 5000, Decimal::new(49990, 2)),
        ];
        if let Ok(mut state) = store.state.lock() {
            for (tier, name, notifications, warnings, fines, packages, price) in defaults {
                state.plans.insert(
                    tier,
                    Plan {
                        id: Uuid::new_v4(),
                        tier,
                        name: name.to_string(),
                        notifications_limit: notifications,
                        warnings_limit: warnings,
                        fines_limit: fines,
                        package_notifications_limit: packages,
                        price,
                        is_active: true,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
    }

    /// Give `user_id` a role, optionally scoped to one condominium.
    pub fn grant_role(
        &self,
        user_id: Uuid,
        role: Role,
        condominium_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        self.lock()?.grants.push(RoleGrant {
            user_id,
            role,
            condominium_id,
        });
        Ok(())
    }

    /// Replace a subscription row wholesale. Lets tests set up expired
    /// periods or exhausted counters directly.
    pub fn put_subscription(&self, subscription: Subscription) -> Result<(), AppError> {
        self.lock()?
            .subscriptions
            .insert(subscription.condominium_id, subscription);
        Ok(())
    }
}

fn compare_invoices(a: &Invoice, b: &Invoice, preferences: ListPreferences) -> Ordering {
    // Missing invoice numbers sort last in both directions.
    let primary = match preferences.sort_by {
        InvoiceSortField::DueDate => directed(a.due_date.cmp(&b.due_date), preferences.direction),
        InvoiceSortField::CreatedAt => {
            directed(a.created_at.cmp(&b.created_at), preferences.direction)
        }
        InvoiceSortField::Amount => directed(a.amount.cmp(&b.amount), preferences.direction),
        InvoiceSortField::InvoiceNumber => match (&a.invoice_number, &b.invoice_number) {
            (Some(x), Some(y)) => directed(x.cmp(y), preferences.direction),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Plan>, AppError> {
        let state = self.lock()?;
        let mut plans: Vec<Plan> = state.plans.values().filter(|p| p.is_active).cloned().collect();
        plans.sort_by(|a, b| a.price.cmp(&b.price));
        Ok(plans)
    }

    async fn get_by_tier(&self, tier: PlanTier) -> Result<Option<Plan>, AppError> {
        Ok(self.lock()?.plans.get(&tier).cloned())
    }

    async fn update(&self, tier: PlanTier, changes: &PlanUpdate) -> Result<Option<Plan>, AppError> {
        let mut state = self.lock()?;
        let Some(plan) = state.plans.get_mut(&tier) else {
            return Ok(None);
        };
        changes.apply_to(plan);
        plan.updated_at = Utc::now();
        Ok(Some(plan.clone()))
    }
}

#[async_trait]
impl CondominiumStore for MemoryStore {
    async fn create_with_subscription(
        &self,
        name: &str,
        tier: PlanTier,
        options: &SubscriptionOptions,
        now: DateTime<Utc>,
    ) -> Result<(Condominium, Subscription), AppError> {
        let mut state = self.lock()?;
        let plan = state
            .plans
            .get(&tier)
            .ok_or_else(|| AppError::NotFound(format!("Plan '{}' not found", tier)))?;

        let condominium = Condominium {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        // Built before either insert so a rejected subscription leaves no
        // orphaned condominium behind.
        let subscription = billing::new_subscription(condominium.id, plan, options, now)?;

        state.condominiums.insert(condominium.id, condominium.clone());
        state
            .subscriptions
            .insert(condominium.id, subscription.clone());
        Ok((condominium, subscription))
    }

    async fn get(&self, condominium_id: Uuid) -> Result<Option<Condominium>, AppError> {
        Ok(self.lock()?.condominiums.get(&condominium_id).cloned())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn get_by_condominium(
        &self,
        condominium_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        Ok(self.lock()?.subscriptions.get(&condominium_id).cloned())
    }

    async fn try_consume(
        &self,
        condominium_id: Uuid,
        kind: ResourceKind,
        amount: i32,
        now: DateTime<Utc>,
    ) -> Result<Subscription, AppError> {
        let mut state = self.lock()?;
        let subscription = state
            .subscriptions
            .get_mut(&condominium_id)
            .ok_or(AppError::NoSubscriptionFound { condominium_id })?;

        billing::check_consumption(subscription, kind, amount, now)?;
        subscription.add_usage(kind, amount);
        subscription.updated_at = now;
        Ok(subscription.clone())
    }

    async fn rollover(
        &self,
        condominium_id: Uuid,
        now: DateTime<Utc>,
        policy: &RolloverPolicy,
    ) -> Result<RolloverOutcome, AppError> {
        let mut state = self.lock()?;
        let current = state
            .subscriptions
            .get(&condominium_id)
            .cloned()
            .ok_or(AppError::NoSubscriptionFound { condominium_id })?;
        let plan = state
            .plans
            .get(&current.plan)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Plan '{}' not found", current.plan)))?;

        let Some(change) = billing::plan_rollover(&current, &plan, now, policy)? else {
            return Ok(RolloverOutcome {
                subscription: current,
                rolled_over: false,
                invoice: None,
            });
        };

        let mut subscription = current;
        change.apply(&mut subscription, now);
        let invoice = change.invoice.map(|new| pending_invoice(new, now));

        state
            .subscriptions
            .insert(condominium_id, subscription.clone());
        if let Some(ref invoice) = invoice {
            state.invoices.insert(invoice.id, invoice.clone());
        }

        Ok(RolloverOutcome {
            subscription,
            rolled_over: true,
            invoice,
        })
    }
}

fn pending_invoice(new: NewInvoice, now: DateTime<Utc>) -> Invoice {
    Invoice {
        id: new.id,
        subscription_id: new.subscription_id,
        condominium_id: new.condominium_id,
        invoice_number: new.invoice_number,
        amount: new.amount,
        due_date: new.due_date,
        period_start: new.period_start,
        period_end: new.period_end,
        status: InvoiceStatus::Pending,
        paid_at: None,
        payment_method: None,
        payment_reference: None,
        description: new.description,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn insert(&self, invoice: NewInvoice) -> Result<Invoice, AppError> {
        let mut state = self.lock()?;
        if state.invoices.contains_key(&invoice.id) {
            return Err(AppError::InvalidInput(format!(
                "Invoice {} already exists",
                invoice.id
            )));
        }
        let row = pending_invoice(invoice, Utc::now());
        state.invoices.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        Ok(self.lock()?.invoices.get(&invoice_id).cloned())
    }

    async fn mark_paid(
        &self,
        invoice_id: Uuid,
        payment: &PaymentRecord,
    ) -> Result<Invoice, AppError> {
        let mut state = self.lock()?;
        let invoice = state
            .invoices
            .get_mut(&invoice_id)
            .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        if invoice.status == InvoiceStatus::Paid {
            return Err(AppError::AlreadyPaid {
                invoice_id,
                paid_at: invoice.paid_at,
            });
        }
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_at = Some(payment.paid_at);
        invoice.payment_method = Some(payment.method);
        invoice.payment_reference = payment.reference.clone();
        invoice.updated_at = Utc::now();
        Ok(invoice.clone())
    }

    async fn list(
        &self,
        condominium_id: Option<Uuid>,
        preferences: ListPreferences,
    ) -> Result<Vec<Invoice>, AppError> {
        let state = self.lock()?;
        let mut rows: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|i| condominium_id.is_none_or(|c| i.condominium_id == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_invoices(a, b, preferences));
        Ok(rows)
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn get_user_condominium_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let state = self.lock()?;
        let mut ids: Vec<Uuid> = state
            .grants
            .iter()
            .filter(|g| g.user_id == user_id)
            .filter_map(|g| g.condominium_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn has_role(
        &self,
        user_id: Uuid,
        role: Role,
        condominium_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let state = self.lock()?;
        Ok(state.grants.iter().any(|g| {
            g.user_id == user_id
                && g.role == role
                && condominium_id.is_none_or(|c| g.condominium_id == Some(c))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use condomi_core::models::PaymentMethod;
    use std::sync::Arc;

    async fn onboard(store: &MemoryStore, tier: PlanTier) -> Subscription {
        let (_, subscription) = store
            .create_with_subscription("Residencial Aurora", tier, &Default::default(), Utc::now())
            .await
            .unwrap();
        subscription
    }

    fn new_invoice(condominium_id: Uuid, subscription_id: Uuid, due: NaiveDate) -> NewInvoice {
        let now = Utc::now();
        NewInvoice {
            id: Uuid::new_v4(),
            subscription_id,
            condominium_id,
            invoice_number: None,
            amount: Decimal::new(9990, 2),
            due_date: due,
            period_start: now,
            period_end: now + Duration::days(30),
            description: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consumption_never_overshoots() {
        let store = Arc::new(MemoryStore::with_default_plans());
        let sub = onboard(&store, PlanTier::Start).await;
        let capacity = sub.counter(ResourceKind::Notification).capacity();

        let mut handles = Vec::new();
        for _ in 0..(capacity * 3) {
            let store = store.clone();
            let condo = sub.condominium_id;
            handles.push(tokio::spawn(async move {
                store
                    .try_consume(condo, ResourceKind::Notification, 1, Utc::now())
                    .await
            }));
        }

        let mut ok = 0;
        let mut exceeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AppError::QuotaExceeded { .. }) => exceeded += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(ok, capacity);
        assert_eq!(exceeded, capacity * 2);
        let after = store.get_by_condominium(sub.condominium_id).await.unwrap().unwrap();
        assert_eq!(after.notifications_used, capacity);
    }

    #[tokio::test]
    async fn test_rejected_consumption_leaves_counter_untouched() {
        let store = MemoryStore::with_default_plans();
        let sub = onboard(&store, PlanTier::Start).await;

        let err = store
            .try_consume(sub.condominium_id, ResourceKind::Fine, 6, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { capacity: 5, .. }));

        let after = store.get_by_condominium(sub.condominium_id).await.unwrap().unwrap();
        assert_eq!(after.fines_used, 0);
    }

    #[tokio::test]
    async fn test_unknown_condominium() {
        let store = MemoryStore::with_default_plans();
        let err = store
            .try_consume(Uuid::new_v4(), ResourceKind::Warning, 1, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoSubscriptionFound { .. }));
    }

    #[tokio::test]
    async fn test_mark_paid_only_once() {
        let store = MemoryStore::with_default_plans();
        let sub = onboard(&store, PlanTier::Essencial).await;
        let due = Utc::now().date_naive();
        let invoice = store
            .insert(new_invoice(sub.condominium_id, sub.id, due))
            .await
            .unwrap();

        let first_payment = PaymentRecord {
            method: PaymentMethod::Pix,
            reference: Some("E2E-1".to_string()),
            paid_at: Utc::now(),
        };
        let paid = store.mark_paid(invoice.id, &first_payment).await.unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(paid.paid_at, Some(first_payment.paid_at));

        let second = PaymentRecord {
            method: PaymentMethod::Cash,
            reference: None,
            paid_at: Utc::now() + Duration::hours(1),
        };
        let err = store.mark_paid(invoice.id, &second).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyPaid { .. }));

        let stored = InvoiceStore::get(&store, invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.paid_at, Some(first_payment.paid_at));
        assert_eq!(stored.payment_method, Some(PaymentMethod::Pix));
    }

    #[tokio::test]
    async fn test_list_sorts_by_preferences() {
        let store = MemoryStore::with_default_plans();
        let sub = onboard(&store, PlanTier::Start).await;
        let early = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        store.insert(new_invoice(sub.condominium_id, sub.id, late)).await.unwrap();
        store.insert(new_invoice(sub.condominium_id, sub.id, early)).await.unwrap();
        store
            .insert(new_invoice(Uuid::new_v4(), Uuid::new_v4(), early))
            .await
            .unwrap();

        let asc = ListPreferences {
            sort_by: InvoiceSortField::DueDate,
            direction: SortDirection::Asc,
        };
        let rows = store.list(Some(sub.condominium_id), asc).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].due_date, early);

        let desc = ListPreferences {
            direction: SortDirection::Desc,
            ..asc
        };
        let rows = store.list(None, desc).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].due_date, late);
    }

    #[tokio::test]
    async fn test_role_scope() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let condo_a = Uuid::new_v4();
        let condo_b = Uuid::new_v4();
        store.grant_role(user, Role::Sindico, Some(condo_a)).unwrap();
        store.grant_role(user, Role::Morador, Some(condo_b)).unwrap();

        assert!(store.has_role(user, Role::Sindico, Some(condo_a)).await.unwrap());
        assert!(!store.has_role(user, Role::Sindico, Some(condo_b)).await.unwrap());
        assert!(store.has_role(user, Role::Sindico, None).await.unwrap());
        assert!(!store.has_role(user, Role::Superadmin, None).await.unwrap());

        let mut expected = vec![condo_a, condo_b];
        expected.sort();
        assert_eq!(store.get_user_condominium_ids(user).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_onboarding_requires_known_plan() {
        let store = MemoryStore::new();
        let err = store
            .create_with_subscription("Sem plano", PlanTier::Start, &Default::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let state = store.lock().unwrap();
        assert!(state.condominiums.is_empty());
    }
}
