//! Plan catalogue

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use condomi_core::models::{Plan, PlanTier, PlanUpdate};
use condomi_core::AppError;
use condomi_services::Action;

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/plans",
    tag = "plans",
    responses(
        (status = 200, description = "Active plans", body = [Plan]),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state))]
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    _user: UserContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let plans = state.services.plans.list_active().await?;
    Ok(Json(plans))
}

#[utoipa::path(
    put,
    path = "/api/v1/plans/{tier}",
    tag = "plans",
    params(("tier" = String, Path, description = "start, essencial, profissional or enterprise")),
    request_body = PlanUpdate,
    responses(
        (status = 200, description = "Updated plan", body = Plan),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 403, description = "Superadmin only", body = ErrorResponse),
        (status = 404, description = "Unknown tier", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, changes), fields(user_id = %user.user_id))]
pub async fn update_plan(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(tier): Path<String>,
    ValidatedJson(changes): ValidatedJson<PlanUpdate>,
) -> Result<impl IntoResponse, HttpAppError> {
    let tier: PlanTier = tier.parse().map_err(AppError::InvalidInput)?;
    state
        .services
        .authorizer
        .authorize(user.user_id, Action::ManageBilling)
        .await?;

    let plan = state.services.plans.update(tier, changes).await?;
    tracing::info!(tier = %tier, "Plan updated");
    Ok(Json(plan))
}
