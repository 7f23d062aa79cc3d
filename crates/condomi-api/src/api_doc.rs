//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use condomi_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Condomi Billing API",
        version = "0.1.0",
        description = "Plans, usage limits, invoices and PIX payments for condominium tenants. All endpoints are versioned under /api/v1/."
    ),
    modifiers(&BearerAuth),
    paths(
        handlers::health::health_check,
        handlers::plans::list_plans,
        handlers::plans::update_plan,
        handlers::condominiums::create_condominium,
        handlers::condominiums::rollover,
        handlers::usage::get_usage,
        handlers::usage::consume,
        handlers::invoices::list_invoices,
        handlers::invoices::invoice_statistics,
        handlers::invoices::create_adhoc_invoice,
        handlers::invoices::get_invoice,
        handlers::invoices::record_payment,
        handlers::pix::generate_pix,
        handlers::webhooks::payment_webhook,
    ),
    components(
        schemas(
            models::Plan,
            models::PlanTier,
            models::PlanUpdate,
            models::Condominium,
            models::Subscription,
            models::ResourceKind,
            models::UsageReceipt,
            models::UsageSummary,
            models::UsageCounterView,
            models::RolloverOutcome,
            models::Invoice,
            models::InvoiceStatus,
            models::EffectiveStatus,
            models::PaymentMethod,
            models::AdhocInvoice,
            models::InvoiceView,
            models::DiscountBreakdown,
            models::InvoiceStatistics,
            models::StatBucket,
            models::DocumentType,
            models::PixPayer,
            models::PixCharge,
            handlers::health::HealthResponse,
            handlers::condominiums::CreateCondominiumRequest,
            handlers::condominiums::CreateCondominiumResponse,
            handlers::usage::ConsumeRequest,
            handlers::invoices::RecordPaymentRequest,
            handlers::webhooks::PaymentConfirmation,
            handlers::webhooks::WebhookAck,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness and database checks"),
        (name = "plans", description = "Plan catalogue"),
        (name = "condominiums", description = "Onboarding and billing-period rollover"),
        (name = "usage", description = "Per-period usage limits"),
        (name = "invoices", description = "Invoice lifecycle, statistics and PIX charges"),
        (name = "webhooks", description = "Signed payment gateway callbacks")
    )
)]
pub struct ApiDoc;
