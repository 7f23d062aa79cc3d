//! PIX charge generation
//!
//! Order matters: the payer document is validated first, then the caller is
//! authorized against the invoice's condominium, and only then is the
//! invoice's state looked at. Nothing local changes before the gateway
//! call; the invoice becomes paid when the gateway later confirms it.

use std::sync::Arc;

use condomi_core::models::{PixCharge, PixChargeRequest, PixPayer};
use condomi_core::validation::validate_document;
use condomi_core::AppError;
use condomi_db::InvoiceStore;
use uuid::Uuid;

use super::authorization::{Action, Authorizer};
use super::gateway::PaymentGateway;
use super::invoice::load_authorized;

#[derive(Clone)]
pub struct PixService {
    invoices: Arc<dyn InvoiceStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PixService {
    pub fn new(invoices: Arc<dyn InvoiceStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { invoices, gateway }
    }

    /// Request a PIX QR code for a pending invoice on behalf of `user_id`.
    ///
    /// An invoice the caller may not charge is reported as `NotFound`.
    #[tracing::instrument(skip(self, payer, authorizer))]
    pub async fn generate(
        &self,
        authorizer: &Authorizer,
        user_id: Uuid,
        invoice_id: Uuid,
        payer: PixPayer,
    ) -> Result<PixCharge, AppError> {
        let document = validate_document(payer.document_type, &payer.document_number)?;
        if payer.email.trim().is_empty() || payer.name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "payer name and email are required".to_string(),
            ));
        }

        let invoice = load_authorized(
            self.invoices.as_ref(),
            authorizer,
            user_id,
            invoice_id,
            |condominium_id| Action::GeneratePix { condominium_id },
        )
        .await?;
        if invoice.is_paid() {
            return Err(AppError::AlreadyPaid {
                invoice_id,
                paid_at: invoice.paid_at,
            });
        }

        let request = PixChargeRequest {
            invoice_id,
            payer_email: payer.email.trim().to_string(),
            payer_name: payer.name.trim().to_string(),
            payer_document_type: payer.document_type,
            payer_document_number: document,
        };
        let charge = self.gateway.create_pix_charge(&request).await?;
        tracing::info!(invoice_id = %request.invoice_id, "PIX charge created");
        Ok(charge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::Clock;
    use crate::services::invoice::InvoiceService;
    use crate::test_helpers::{fixture, FixedClock, StubGateway};
    use chrono::Duration;
    use condomi_core::models::{
        AdhocInvoice, DocumentType, Invoice, PaymentMethod, PlanTier, Role,
    };
    use condomi_core::BillingConfig;
    use condomi_db::MemoryStore;
    use rust_decimal::Decimal;

    struct Harness {
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
        authorizer: Authorizer,
        admin: Uuid,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::with_default_plans());
        let admin = Uuid::new_v4();
        store.grant_role(admin, Role::Superadmin, None).unwrap();
        Harness {
            authorizer: Authorizer::new(store.clone()),
            clock: Arc::new(FixedClock::default()),
            store,
            admin,
        }
    }

    fn payer(document: &str) -> PixPayer {
        PixPayer {
            email: "sindico@example.com".to_string(),
            name: "Maria Souza".to_string(),
            document_type: DocumentType::Cpf,
            document_number: document.to_string(),
        }
    }

    fn invoices(h: &Harness) -> InvoiceService {
        InvoiceService::new(
            h.store.clone(),
            h.store.clone(),
            BillingConfig::default(),
            h.clock.clone(),
        )
    }

    async fn pending_invoice(h: &Harness) -> Invoice {
        let (condo, _) = fixture::onboard(&h.store, PlanTier::Start, h.clock.now()).await;
        invoices(h)
            .create_adhoc(AdhocInvoice {
                condominium_id: condo.id,
                amount: Decimal::new(9990, 2),
                due_date: h.clock.today() + Duration::days(5),
                description: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_digits_only() {
        let h = harness();
        let gateway = Arc::new(StubGateway::succeeding());
        let service = PixService::new(h.store.clone(), gateway.clone());
        let invoice = pending_invoice(&h).await;

        let charge = service
            .generate(&h.authorizer, h.admin, invoice.id, payer("529.982.247-25"))
            .await
            .unwrap();
        assert!(!charge.qr_code.is_empty());

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].payer_document_number, "52998224725");
        assert_eq!(calls[0].invoice_id, invoice.id);
    }

    #[tokio::test]
    async fn test_invalid_document_checked_before_lookup() {
        let h = harness();
        let gateway = Arc::new(StubGateway::succeeding());
        let service = PixService::new(h.store.clone(), gateway.clone());

        // The invoice does not exist either; the document error wins.
        for bad in ["123.456.789-00", "111.111.111-11"] {
            let err = service
                .generate(&h.authorizer, h.admin, Uuid::new_v4(), payer(bad))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidDocument(_)), "{bad}");
        }
        assert!(gateway.calls().is_empty());

        let err = service
            .generate(&h.authorizer, h.admin, Uuid::new_v4(), payer("123.456.789-09"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_paid_invoice_rejected_without_remote_call() {
        let h = harness();
        let gateway = Arc::new(StubGateway::succeeding());
        let service = PixService::new(h.store.clone(), gateway.clone());
        let invoice = pending_invoice(&h).await;
        invoices(&h)
            .record_payment(invoice.id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        let err = service
            .generate(&h.authorizer, h.admin, invoice.id, payer("529.982.247-25"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyPaid { .. }));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_invoice_pending() {
        let h = harness();
        let service = PixService::new(h.store.clone(), Arc::new(StubGateway::failing()));
        let invoice = pending_invoice(&h).await;

        let err = service
            .generate(&h.authorizer, h.admin, invoice.id, payer("529.982.247-25"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RemoteUnavailable(_)));

        let stored = h.store.get(invoice.id).await.unwrap().unwrap();
        assert!(!stored.is_paid());
    }

    #[tokio::test]
    async fn test_requires_sindico_of_condominium() {
        let h = harness();
        let gateway = Arc::new(StubGateway::succeeding());
        let service = PixService::new(h.store.clone(), gateway.clone());
        let invoice = pending_invoice(&h).await;

        let porteiro = Uuid::new_v4();
        h.store
            .grant_role(porteiro, Role::Porteiro, Some(invoice.condominium_id))
            .unwrap();
        let err = service
            .generate(&h.authorizer, porteiro, invoice.id, payer("529.982.247-25"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(gateway.calls().is_empty());

        let sindico = Uuid::new_v4();
        h.store
            .grant_role(sindico, Role::Sindico, Some(invoice.condominium_id))
            .unwrap();
        assert!(service
            .generate(&h.authorizer, sindico, invoice.id, payer("529.982.247-25"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_outsider_cannot_learn_paid_state() {
        let h = harness();
        let service = PixService::new(h.store.clone(), Arc::new(StubGateway::succeeding()));
        let invoice = pending_invoice(&h).await;
        invoices(&h)
            .record_payment(invoice.id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        let outsider = Uuid::new_v4();
        h.store.grant_role(outsider, Role::Morador, None).unwrap();
        let err = service
            .generate(&h.authorizer, outsider, invoice.id, payer("529.982.247-25"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
