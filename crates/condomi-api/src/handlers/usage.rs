//! Usage counters

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use condomi_core::models::{ResourceKind, UsageReceipt, UsageSummary};
use condomi_core::AppError;
use condomi_services::Action;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConsumeRequest {
    /// Units to consume; defaults to 1.
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 10000))]
    pub amount: i32,
}

#[utoipa::path(
    get,
    path = "/api/v1/condominiums/{id}/usage",
    tag = "usage",
    params(("id" = Uuid, Path, description = "Condominium ID")),
    responses(
        (status = 200, description = "Counters for the current period", body = UsageSummary),
        (status = 403, description = "Not a manager of this condominium", body = ErrorResponse),
        (status = 404, description = "No subscription", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .services
        .authorizer
        .authorize(user.user_id, Action::ViewBilling { condominium_id: id })
        .await?;
    let summary = state.services.usage.usage_summary(id).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/api/v1/condominiums/{id}/usage/{kind}",
    tag = "usage",
    params(
        ("id" = Uuid, Path, description = "Condominium ID"),
        ("kind" = String, Path, description = "notifications, warnings, fines or package_notifications")
    ),
    request_body = ConsumeRequest,
    responses(
        (status = 200, description = "Quota consumed", body = UsageReceipt),
        (status = 402, description = "Quota exceeded or subscription inactive", body = ErrorResponse),
        (status = 403, description = "Role not allowed", body = ErrorResponse),
        (status = 404, description = "No subscription", body = ErrorResponse),
        (status = 409, description = "Billing period expired", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id))]
pub async fn consume(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path((id, kind)): Path<(Uuid, String)>,
    ValidatedJson(request): ValidatedJson<ConsumeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    let kind: ResourceKind = kind.parse().map_err(AppError::InvalidInput)?;
    state
        .services
        .authorizer
        .authorize(
            user.user_id,
            Action::ConsumeQuota {
                condominium_id: id,
                kind,
            },
        )
        .await?;

    let receipt = state.services.usage.consume(id, kind, request.amount).await?;
    Ok(Json(receipt))
}
