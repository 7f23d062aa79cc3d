//! Application state shared by every handler.

use std::sync::Arc;

use condomi_db::Stores;
use condomi_services::BillingServices;

use crate::auth::JwtVerifier;

#[derive(Clone)]
pub struct AppState {
    pub services: BillingServices,
    /// Kept for health checks.
    pub stores: Stores,
    pub jwt: JwtVerifier,
    /// Shared secret for payment webhooks. `None` rejects every delivery.
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(
        services: BillingServices,
        stores: Stores,
        jwt: JwtVerifier,
        webhook_secret: Option<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            services,
            stores,
            jwt,
            webhook_secret,
        })
    }
}
