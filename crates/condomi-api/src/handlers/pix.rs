use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use condomi_core::models::{PixCharge, PixPayer};
use uuid::Uuid;

use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/pix",
    tag = "invoices",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = PixPayer,
    responses(
        (status = 200, description = "PIX QR code", body = PixCharge),
        (status = 400, description = "Missing payer data", body = ErrorResponse),
        (status = 404, description = "Invoice not found or not chargeable by the caller", body = ErrorResponse),
        (status = 409, description = "Invoice already paid", body = ErrorResponse),
        (status = 422, description = "Invalid CPF/CNPJ", body = ErrorResponse),
        (status = 503, description = "Payment gateway unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, payer), fields(user_id = %user.user_id))]
pub async fn generate_pix(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
    ValidatedJson(payer): ValidatedJson<PixPayer>,
) -> Result<impl IntoResponse, HttpAppError> {
    let charge = state
        .services
        .pix
        .generate(&state.services.authorizer, user.user_id, id, payer)
        .await?;
    Ok(Json(charge))
}
