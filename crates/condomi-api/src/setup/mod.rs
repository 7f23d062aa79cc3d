//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod validation;

use std::sync::Arc;

use anyhow::{Context, Result};
use condomi_core::Config;
use condomi_db::Stores;
use condomi_infra::LogFormat;
use condomi_services::{
    BillingServices, Clock, DisabledGateway, HttpPaymentGateway, PaymentGateway, SystemClock,
};

use crate::auth::JwtVerifier;
use crate::state::AppState;

/// Initialize the entire application against PostgreSQL.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    validation::validate_config(&config).context("Configuration validation failed")?;

    condomi_infra::init_telemetry("condomi-api", config.environment(), LogFormat::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let stores = Stores::postgres(pool);

    let gateway: Arc<dyn PaymentGateway> = match HttpPaymentGateway::from_config(config.billing())
        .context("Failed to build payment gateway client")?
    {
        Some(gateway) => Arc::new(gateway),
        None => {
            tracing::warn!("PAYMENT_GATEWAY_URL not set; PIX generation is disabled");
            Arc::new(DisabledGateway)
        }
    };

    let state = build_state(&config, stores, gateway, Arc::new(SystemClock));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Wire services over the given stores, gateway and clock.
pub fn build_state(
    config: &Config,
    stores: Stores,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
) -> Arc<AppState> {
    let services = BillingServices::new(&stores, gateway, config.billing(), clock);
    AppState::new(
        services,
        stores,
        JwtVerifier::from_secret(config.jwt_secret().as_bytes()),
        config.billing().payment_webhook_secret.clone(),
    )
}
