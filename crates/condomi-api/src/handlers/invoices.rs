//! Invoice listing, statistics and lifecycle

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use condomi_core::models::{
    AdhocInvoice, EffectiveStatus, Invoice, InvoiceFilter, InvoiceSortField, InvoiceStatistics,
    InvoiceView, ListPreferences, PaymentMethod, SortDirection,
};
use condomi_core::AppError;
use condomi_services::Action;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::UserContext;
use crate::constants::MAX_PAGE_SIZE;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListInvoicesQuery {
    /// Restrict to one condominium; omit for every tenant (superadmin).
    pub condominium_id: Option<Uuid>,
    /// pending, overdue or paid
    pub status: Option<String>,
    /// due_date, created_at, amount or invoice_number
    pub sort_by: Option<String>,
    /// asc or desc
    pub direction: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListInvoicesQuery {
    fn preferences(&self, defaults: ListPreferences) -> Result<ListPreferences, AppError> {
        let sort_by = match self.sort_by.as_deref() {
            Some(s) => s.parse::<InvoiceSortField>().map_err(AppError::InvalidInput)?,
            None => defaults.sort_by,
        };
        let direction = match self.direction.as_deref() {
            Some(s) => s.parse::<SortDirection>().map_err(AppError::InvalidInput)?,
            None => defaults.direction,
        };
        Ok(ListPreferences { sort_by, direction })
    }

    fn filter(&self) -> Result<InvoiceFilter, AppError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<EffectiveStatus>)
            .transpose()
            .map_err(AppError::InvalidInput)?;
        Ok(InvoiceFilter {
            condominium_id: self.condominium_id,
            status,
            limit: Some(self.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE)),
            offset: self.offset.unwrap_or(0),
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct StatisticsQuery {
    pub condominium_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    pub method: PaymentMethod,
    #[validate(length(max = 200))]
    pub reference: Option<String>,
}

/// Scope check shared by list and statistics: one condominium needs a
/// billing role there, all condominiums need superadmin.
async fn authorize_scope(
    state: &AppState,
    user: UserContext,
    condominium_id: Option<Uuid>,
) -> Result<(), AppError> {
    let action = match condominium_id {
        Some(condominium_id) => Action::ViewBilling { condominium_id },
        None => Action::ManageBilling,
    };
    state.services.authorizer.authorize(user.user_id, action).await
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    tag = "invoices",
    params(ListInvoicesQuery),
    responses(
        (status = 200, description = "Invoices in the requested order", body = [InvoiceView]),
        (status = 400, description = "Invalid filter or sort", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let preferences = query.preferences(state.services.invoices.default_preferences())?;
    let filter = query.filter()?;
    authorize_scope(&state, user, filter.condominium_id).await?;

    let invoices = state.services.invoices.list(filter, preferences).await?;
    Ok(Json(invoices))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/stats",
    tag = "invoices",
    params(StatisticsQuery),
    responses(
        (status = 200, description = "Aggregates by effective status", body = InvoiceStatistics),
        (status = 403, description = "Not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn invoice_statistics(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Query(query): Query<StatisticsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    authorize_scope(&state, user, query.condominium_id).await?;
    let stats = state
        .services
        .invoices
        .statistics(query.condominium_id)
        .await?;
    Ok(Json(stats))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/adhoc",
    tag = "invoices",
    request_body = AdhocInvoice,
    responses(
        (status = 201, description = "Ad-hoc invoice created", body = Invoice),
        (status = 400, description = "Invalid amount or description", body = ErrorResponse),
        (status = 403, description = "Superadmin only", body = ErrorResponse),
        (status = 404, description = "Condominium has no subscription", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id))]
pub async fn create_adhoc_invoice(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    ValidatedJson(request): ValidatedJson<AdhocInvoice>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .services
        .authorizer
        .authorize(user.user_id, Action::ManageBilling)
        .await?;
    let invoice = state.services.invoices.create_adhoc(request).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    tag = "invoices",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice with derived status and discount", body = InvoiceView),
        (status = 404, description = "Invoice not found or not visible to the caller", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let view = state
        .services
        .invoices
        .get(&state.services.authorizer, user.user_id, id)
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/payment",
    tag = "invoices",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Invoice marked paid", body = Invoice),
        (status = 403, description = "Superadmin only", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse),
        (status = 409, description = "Invoice already paid", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id))]
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RecordPaymentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    state
        .services
        .authorizer
        .authorize(user.user_id, Action::ManageBilling)
        .await?;
    let invoice = state
        .services
        .invoices
        .record_payment(id, request.method, request.reference)
        .await?;
    tracing::info!(invoice_id = %invoice.id, method = %request.method, "Payment recorded");
    Ok(Json(invoice))
}
