//! Startup configuration checks

use anyhow::Result;
use condomi_core::Config;

/// Hard failures come from `Config::validate`; this adds the warnings that
/// should not stop a deployment.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && std::env::var("ENVIRONMENT").is_err() {
        tracing::warn!("Production mode detected but ENVIRONMENT not set");
    }

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS allows all origins - not recommended outside development");
    }

    let billing = config.billing();
    if billing.payment_gateway_url.is_some() && billing.payment_gateway_token.is_none() {
        tracing::warn!("PAYMENT_GATEWAY_URL set without PAYMENT_GATEWAY_TOKEN");
    }
    if billing.payment_webhook_secret.is_none() {
        tracing::warn!("PAYMENT_WEBHOOK_SECRET not set; payment webhooks will be rejected");
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
