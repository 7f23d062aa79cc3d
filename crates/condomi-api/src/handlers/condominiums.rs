//! Onboarding and period rollover

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use condomi_core::models::{
    Condominium, PlanTier, RolloverOutcome, Subscription, SubscriptionOptions,
};
use condomi_services::Action;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCondominiumRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub plan: PlanTier,
    #[serde(default)]
    pub is_lifetime: bool,
    #[validate(range(max = 365))]
    pub trial_days: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub package_notifications_extra: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateCondominiumResponse {
    pub condominium: Condominium,
    pub subscription: Subscription,
}

#[utoipa::path(
    post,
    path = "/api/v1/condominiums",
    tag = "condominiums",
    request_body = CreateCondominiumRequest,
    responses(
        (status = 201, description = "Condominium and subscription created", body = CreateCondominiumResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Superadmin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id, plan = ?request.plan))]
pub async fn create_condominium(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    ValidatedJson(request): ValidatedJson<CreateCondominiumRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    state
        .services
        .authorizer
        .authorize(user.user_id, Action::ManageBilling)
        .await?;

    let options = SubscriptionOptions {
        is_lifetime: request.is_lifetime,
        trial_days: request.trial_days,
        package_notifications_extra: request.package_notifications_extra,
    };
    let (condominium, subscription) = state
        .services
        .subscriptions
        .create_condominium(&request.name, request.plan, options)
        .await?;

    tracing::info!(condominium_id = %condominium.id, "Condominium onboarded");
    Ok((
        StatusCode::CREATED,
        Json(CreateCondominiumResponse {
            condominium,
            subscription,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/condominiums/{id}/rollover",
    tag = "condominiums",
    params(("id" = Uuid, Path, description = "Condominium ID")),
    responses(
        (status = 200, description = "Rollover result; rolled_over is false while the period runs", body = RolloverOutcome),
        (status = 403, description = "Superadmin only", body = ErrorResponse),
        (status = 404, description = "No subscription", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn rollover(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .services
        .authorizer
        .authorize(user.user_id, Action::ManageBilling)
        .await?;
    let outcome = state.services.subscriptions.rollover(id).await?;
    Ok(Json(outcome))
}
