//! Invoice lifecycle
//!
//! Invoices are stored as `pending` or `paid`; `overdue` only exists in the
//! views built here. Payment goes through the store's conditional update, so
//! manual recording and gateway confirmation cannot both win.

use std::sync::Arc;

use condomi_core::billing;
use condomi_core::models::{
    AdhocInvoice, Invoice, InvoiceFilter, InvoiceStatistics, InvoiceView, ListPreferences,
    NewInvoice, PaymentMethod, PaymentRecord,
};
use condomi_core::{AppError, BillingConfig};
use condomi_db::{InvoiceStore, SubscriptionStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::authorization::{Action, Authorizer};
use super::clock::Clock;

const MAX_DESCRIPTION_LENGTH: usize = 500;

pub(crate) fn invoice_not_found(invoice_id: Uuid) -> AppError {
    AppError::NotFound(format!("Invoice {} not found", invoice_id))
}

/// Load an invoice and check `user_id` may act on its condominium.
///
/// Nothing about the invoice is inspected before the check passes, and a
/// denial is the same `NotFound` as a missing invoice.
pub(crate) async fn load_authorized(
    invoices: &dyn InvoiceStore,
    authorizer: &Authorizer,
    user_id: Uuid,
    invoice_id: Uuid,
    action: impl FnOnce(Uuid) -> Action,
) -> Result<Invoice, AppError> {
    let invoice = invoices
        .get(invoice_id)
        .await?
        .ok_or_else(|| invoice_not_found(invoice_id))?;
    authorizer
        .authorize_or_hide(
            user_id,
            action(invoice.condominium_id),
            invoice_not_found(invoice_id),
        )
        .await?;
    Ok(invoice)
}

#[derive(Clone)]
pub struct InvoiceService {
    invoices: Arc<dyn InvoiceStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    config: BillingConfig,
    clock: Arc<dyn Clock>,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        config: BillingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            invoices,
            subscriptions,
            config,
            clock,
        }
    }

    /// Sort preferences used when the caller does not supply any.
    pub fn default_preferences(&self) -> ListPreferences {
        self.config.default_list_preferences()
    }

    /// Invoice with its derived status and discount, if `user_id` may view
    /// its condominium's billing.
    #[tracing::instrument(skip(self, authorizer))]
    pub async fn get(
        &self,
        authorizer: &Authorizer,
        user_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<InvoiceView, AppError> {
        let invoice = load_authorized(
            self.invoices.as_ref(),
            authorizer,
            user_id,
            invoice_id,
            |condominium_id| Action::ViewBilling { condominium_id },
        )
        .await?;
        Ok(InvoiceView::new(invoice, self.clock.today()))
    }

    /// List invoices. The status filter compares effective status, so
    /// `overdue` selects pending invoices past their due date.
    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        filter: InvoiceFilter,
        preferences: ListPreferences,
    ) -> Result<Vec<InvoiceView>, AppError> {
        let today = self.clock.today();
        let rows = self
            .invoices
            .list(filter.condominium_id, preferences)
            .await?;

        let views = rows
            .into_iter()
            .map(|invoice| InvoiceView::new(invoice, today))
            .filter(|view| filter.status.is_none_or(|s| view.effective_status == s))
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(views)
    }

    /// Aggregate statistics over all invoices, or one condominium's.
    #[tracing::instrument(skip(self))]
    pub async fn statistics(
        &self,
        condominium_id: Option<Uuid>,
    ) -> Result<InvoiceStatistics, AppError> {
        let rows = self
            .invoices
            .list(condominium_id, self.default_preferences())
            .await?;
        Ok(billing::compute_statistics(&rows, self.clock.today()))
    }

    /// Issue an ad-hoc invoice ("fatura avulsa") covering one month from now.
    ///
    /// The subscription is resolved first; without one nothing is written.
    #[tracing::instrument(skip(self, request), fields(condominium_id = %request.condominium_id))]
    pub async fn create_adhoc(&self, request: AdhocInvoice) -> Result<Invoice, AppError> {
        if request.amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "amount must be greater than zero".to_string(),
            ));
        }
        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH)
        {
            return Err(AppError::InvalidInput(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }

        let subscription = self
            .subscriptions
            .get_by_condominium(request.condominium_id)
            .await?
            .ok_or(AppError::NoSubscriptionFound {
                condominium_id: request.condominium_id,
            })?;

        let now = self.clock.now();
        let (period_start, period_end) = billing::adhoc_period(now).ok_or_else(|| {
            AppError::Internal("Billing period overflowed the calendar".to_string())
        })?;
        let id = Uuid::new_v4();

        let invoice = self
            .invoices
            .insert(NewInvoice {
                id,
                subscription_id: subscription.id,
                condominium_id: subscription.condominium_id,
                invoice_number: Some(billing::invoice_number(
                    &self.config.invoice_number_prefix,
                    now,
                    id,
                )),
                amount: request.amount.round_dp(2),
                due_date: request.due_date,
                period_start,
                period_end,
                description,
            })
            .await?;

        tracing::info!(
            invoice_id = %invoice.id,
            invoice_number = ?invoice.invoice_number,
            "Ad-hoc invoice issued"
        );
        Ok(invoice)
    }

    /// Record a payment received outside the gateway (manual reconciliation).
    #[tracing::instrument(skip(self, reference))]
    pub async fn record_payment(
        &self,
        invoice_id: Uuid,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> Result<Invoice, AppError> {
        let payment = PaymentRecord {
            method,
            reference: reference.filter(|r| !r.trim().is_empty()),
            paid_at: self.clock.now(),
        };
        self.mark_paid(invoice_id, payment).await
    }

    /// Apply a payment confirmation pushed by the payment gateway.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_gateway_payment(
        &self,
        invoice_id: Uuid,
        reference: String,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<Invoice, AppError> {
        let payment = PaymentRecord {
            method: PaymentMethod::Pix,
            reference: Some(reference),
            paid_at: paid_at.unwrap_or_else(|| self.clock.now()),
        };
        self.mark_paid(invoice_id, payment).await
    }

    async fn mark_paid(
        &self,
        invoice_id: Uuid,
        payment: PaymentRecord,
    ) -> Result<Invoice, AppError> {
        match self.invoices.mark_paid(invoice_id, &payment).await {
            Ok(invoice) => {
                tracing::info!(
                    invoice_id = %invoice_id,
                    method = %payment.method,
                    "Invoice paid"
                );
                Ok(invoice)
            }
            Err(e @ AppError::AlreadyPaid { .. }) => {
                tracing::info!(invoice_id = %invoice_id, "Duplicate payment ignored");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{fixture, FixedClock};
    use chrono::{Duration, NaiveDate};
    use condomi_core::models::{EffectiveStatus, InvoiceStatus, PlanTier, Role};
    use condomi_db::MemoryStore;

    struct Harness {
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
        service: InvoiceService,
        authorizer: Authorizer,
        admin: Uuid,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::with_default_plans());
        let clock = Arc::new(FixedClock::default());
        let service = InvoiceService::new(
            store.clone(),
            store.clone(),
            BillingConfig::default(),
            clock.clone(),
        );
        let admin = Uuid::new_v4();
        store.grant_role(admin, Role::Superadmin, None).unwrap();
        Harness {
            authorizer: Authorizer::new(store.clone()),
            store,
            clock,
            service,
            admin,
        }
    }

    fn adhoc(condominium_id: Uuid, amount: i64, due_date: NaiveDate) -> AdhocInvoice {
        AdhocInvoice {
            condominium_id,
            amount: Decimal::new(amount, 0),
            due_date,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_adhoc_without_subscription_writes_nothing() {
        let h = harness();
        let err = h
            .service
            .create_adhoc(adhoc(Uuid::new_v4(), 100, h.clock.today()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoSubscriptionFound { .. }));
        assert!(h
            .service
            .list(InvoiceFilter::default(), h.service.default_preferences())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_adhoc_invoice_covers_one_month() {
        let h = harness();
        let (condo, sub) = fixture::onboard(&h.store, PlanTier::Start, h.clock.now()).await;

        let invoice = h
            .service
            .create_adhoc(AdhocInvoice {
                description: Some("Taxa extra - Desconto: 15%".to_string()),
                ..adhoc(condo.id, 85, h.clock.today())
            })
            .await
            .unwrap();

        assert_eq!(invoice.subscription_id, sub.id);
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.period_start, h.clock.now());
        assert_eq!(
            invoice.period_end,
            billing::add_months(h.clock.now(), 1).unwrap()
        );
        assert!(invoice.invoice_number.as_deref().unwrap().starts_with("FAT-"));

        let view = h.service.get(&h.authorizer, h.admin, invoice.id).await.unwrap();
        assert_eq!(view.discount.original_amount, Decimal::new(100, 0));
        assert_eq!(view.discount.discount_value, Decimal::new(15, 0));
    }

    #[tokio::test]
    async fn test_overdue_is_derived_not_stored() {
        let h = harness();
        let (condo, _) = fixture::onboard(&h.store, PlanTier::Start, h.clock.now()).await;
        let invoice = h
            .service
            .create_adhoc(adhoc(condo.id, 50, h.clock.today() + Duration::days(3)))
            .await
            .unwrap();
        assert_eq!(
            h.service.get(&h.authorizer, h.admin, invoice.id).await.unwrap().effective_status,
            EffectiveStatus::Pending
        );

        h.clock.advance(Duration::days(5));
        let view = h.service.get(&h.authorizer, h.admin, invoice.id).await.unwrap();
        assert_eq!(view.effective_status, EffectiveStatus::Overdue);
        assert_eq!(view.invoice.status, InvoiceStatus::Pending);

        let overdue = h
            .service
            .list(
                InvoiceFilter {
                    status: Some(EffectiveStatus::Overdue),
                    ..Default::default()
                },
                h.service.default_preferences(),
            )
            .await
            .unwrap();
        assert_eq!(overdue.len(), 1);

        let stats = h.service.statistics(Some(condo.id)).await.unwrap();
        assert_eq!(stats.overdue.count, 1);
        assert_eq!(stats.pending.count, 0);
    }

    #[tokio::test]
    async fn test_payment_is_idempotent() {
        let h = harness();
        let (condo, _) = fixture::onboard(&h.store, PlanTier::Start, h.clock.now()).await;
        let invoice = h
            .service
            .create_adhoc(adhoc(condo.id, 120, h.clock.today()))
            .await
            .unwrap();

        let paid = h
            .service
            .record_payment(invoice.id, PaymentMethod::BankTransfer, Some("TED-42".into()))
            .await
            .unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        let first_paid_at = paid.paid_at;
        assert!(first_paid_at.is_some());

        h.clock.advance(Duration::hours(2));
        let err = h
            .service
            .confirm_gateway_payment(invoice.id, "pix-e2e-1".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyPaid { .. }));

        let view = h.service.get(&h.authorizer, h.admin, invoice.id).await.unwrap();
        assert_eq!(view.invoice.paid_at, first_paid_at);
        assert_eq!(view.invoice.payment_method, Some(PaymentMethod::BankTransfer));
        assert_eq!(view.effective_status, EffectiveStatus::Paid);
    }

    #[tokio::test]
    async fn test_list_paginates_after_filtering() {
        let h = harness();
        let (condo, _) = fixture::onboard(&h.store, PlanTier::Start, h.clock.now()).await;
        for days in 1..=5 {
            h.service
                .create_adhoc(adhoc(condo.id, 10 * days, h.clock.today() + Duration::days(days)))
                .await
                .unwrap();
        }

        let page = h
            .service
            .list(
                InvoiceFilter {
                    condominium_id: Some(condo.id),
                    limit: Some(2),
                    offset: 1,
                    ..Default::default()
                },
                h.service.default_preferences(),
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        // Default order is due date descending.
        assert!(page[0].invoice.due_date > page[1].invoice.due_date);
    }

    #[tokio::test]
    async fn test_adhoc_rejects_non_positive_amount() {
        let h = harness();
        let (condo, _) = fixture::onboard(&h.store, PlanTier::Start, h.clock.now()).await;
        let err = h
            .service
            .create_adhoc(adhoc(condo.id, 0, h.clock.today()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_foreign_invoice_looks_missing() {
        let h = harness();
        let (condo, _) = fixture::onboard(&h.store, PlanTier::Start, h.clock.now()).await;
        let (other, _) = fixture::onboard(&h.store, PlanTier::Start, h.clock.now()).await;
        let invoice = h
            .service
            .create_adhoc(adhoc(condo.id, 80, h.clock.today()))
            .await
            .unwrap();
        h.service
            .record_payment(invoice.id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        let outsider = Uuid::new_v4();
        h.store
            .grant_role(outsider, Role::Sindico, Some(other.id))
            .unwrap();
        let err = h
            .service
            .get(&h.authorizer, outsider, invoice.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(
            err.to_string(),
            invoice_not_found(invoice.id).to_string()
        );

        let sindico = Uuid::new_v4();
        h.store
            .grant_role(sindico, Role::Sindico, Some(condo.id))
            .unwrap();
        let view = h.service.get(&h.authorizer, sindico, invoice.id).await.unwrap();
        assert_eq!(view.effective_status, EffectiveStatus::Paid);
    }
}
