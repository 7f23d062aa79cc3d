//! Payment gateway client
//!
//! The gateway turns an invoice plus payer data into a payable PIX QR code.
//! No retries: a failed call surfaces as `RemoteUnavailable` and the caller
//! decides whether to try again.

use std::time::Duration;

use async_trait::async_trait;
use condomi_core::models::{PixCharge, PixChargeRequest};
use condomi_core::{AppError, BillingConfig};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_pix_charge(&self, request: &PixChargeRequest) -> Result<PixCharge, AppError>;
}

/// HTTP client for the gateway's `POST {base}/pix` endpoint.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpPaymentGateway {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Gateway from configuration, or `None` when no URL is configured.
    pub fn from_config(config: &BillingConfig) -> Result<Option<Self>, AppError> {
        config
            .payment_gateway_url
            .as_deref()
            .map(|url| {
                Self::new(
                    url,
                    config.payment_gateway_token.clone(),
                    Duration::from_secs(config.payment_gateway_timeout_seconds),
                )
            })
            .transpose()
    }

    fn charges_url(&self) -> String {
        format!("{}/pix", self.base_url)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[tracing::instrument(skip(self, request), fields(invoice_id = %request.invoice_id))]
    async fn create_pix_charge(&self, request: &PixChargeRequest) -> Result<PixCharge, AppError> {
        let mut call = self.client.post(self.charges_url()).json(request);
        if let Some(ref token) = self.token {
            call = call.bearer_auth(token);
        }

        let response = call.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Payment gateway request failed");
            AppError::RemoteUnavailable(format!("Payment gateway request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %error_text, "Payment gateway rejected charge");
            return Err(AppError::RemoteUnavailable(format!(
                "Payment gateway responded with status {}",
                status
            )));
        }

        response.json::<PixCharge>().await.map_err(|e| {
            AppError::RemoteUnavailable(format!("Invalid payment gateway response: {}", e))
        })
    }
}

/// Stand-in used when no gateway is configured; every charge fails as
/// unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_pix_charge(&self, _request: &PixChargeRequest) -> Result<PixCharge, AppError> {
        Err(AppError::RemoteUnavailable(
            "PIX payments are not configured".to_string(),
        ))
    }
}
