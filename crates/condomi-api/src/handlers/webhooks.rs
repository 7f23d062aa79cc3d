//! Payment gateway confirmations
//!
//! Deliveries are authenticated by an HMAC-SHA256 signature over the raw
//! body. Redelivery of an already settled invoice is acknowledged so the
//! gateway stops retrying.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use condomi_core::AppError;
use condomi_infra::webhook::{verify_signature, SIGNATURE_HEADER};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

const SETTLED_STATUSES: [&str; 3] = ["paid", "approved", "confirmed"];

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentConfirmation {
    pub invoice_id: Uuid,
    /// Gateway transaction id, stored as the payment reference.
    pub transaction_id: String,
    /// Settlement status reported by the gateway; absent means settled.
    pub status: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub status: String,
    pub invoice_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payment",
    tag = "webhooks",
    request_body = PaymentConfirmation,
    responses(
        (status = 200, description = "Confirmation applied or already applied", body = WebhookAck),
        (status = 202, description = "Non-settlement event ignored", body = WebhookAck),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Bad or missing signature", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let verified = state
        .webhook_secret
        .as_deref()
        .is_some_and(|secret| verify_signature(secret, &body, signature));
    if !verified {
        tracing::warn!("Rejected payment webhook with invalid signature");
        return Err(AppError::Unauthorized("Invalid webhook signature".to_string()).into());
    }

    let confirmation: PaymentConfirmation = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

    let settled = confirmation
        .status
        .as_deref()
        .map_or(true, |s| SETTLED_STATUSES.contains(&s.to_lowercase().as_str()));
    if !settled {
        tracing::info!(
            invoice_id = %confirmation.invoice_id,
            status = ?confirmation.status,
            "Ignoring non-settlement webhook event"
        );
        return Ok((
            StatusCode::ACCEPTED,
            Json(WebhookAck {
                status: "ignored".to_string(),
                invoice_id: confirmation.invoice_id,
            }),
        ));
    }

    let result = state
        .services
        .invoices
        .confirm_gateway_payment(
            confirmation.invoice_id,
            confirmation.transaction_id,
            confirmation.paid_at,
        )
        .await;

    let status = match result {
        Ok(_) => "paid",
        Err(AppError::AlreadyPaid { .. }) => "already_paid",
        Err(e) => return Err(e.into()),
    };
    Ok((
        StatusCode::OK,
        Json(WebhookAck {
            status: status.to_string(),
            invoice_id: confirmation.invoice_id,
        }),
    ))
}
