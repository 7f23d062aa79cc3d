//! Test helpers: build the router over the in-memory store.
//!
//! No database is needed; the fixed clock starts at 2024-06-15 12:00 UTC and
//! the stub gateway records every PIX request.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{Duration, NaiveDate, Utc};
use condomi_api::auth::JwtClaims;
use condomi_api::constants;
use condomi_api::setup::{build_state, routes};
use condomi_core::models::{Condominium, Invoice, NewInvoice, PlanTier, Role, Subscription};
use condomi_core::{BaseConfig, BillingConfig, Config, ServiceConfig};
use condomi_db::{InvoiceStore, MemoryStore, Stores};
use condomi_services::test_helpers::{fixture, FixedClock, StubGateway};
use condomi_services::Clock;
use rust_decimal::Decimal;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-jwt-secret-0123456789abcdef";
pub const WEBHOOK_SECRET: &str = "integration-test-webhook-secret-0123456789";

pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub gateway: Arc<StubGateway>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id,
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
            nbf: None,
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .unwrap()
    }

    pub fn bearer(&self, user_id: Uuid) -> String {
        format!("Bearer {}", self.token_for(user_id))
    }

    /// New user holding `role`, scoped to `condominium_id` when given.
    pub fn user_with_role(&self, role: Role, condominium_id: Option<Uuid>) -> Uuid {
        let user = Uuid::new_v4();
        self.store.grant_role(user, role, condominium_id).unwrap();
        user
    }

    pub fn superadmin(&self) -> Uuid {
        self.user_with_role(Role::Superadmin, None)
    }

    pub async fn onboard(&self, tier: PlanTier) -> (Condominium, Subscription) {
        fixture::onboard(&self.store, tier, self.clock.now()).await
    }

    /// Insert a pending invoice directly into the store.
    pub async fn seed_invoice(
        &self,
        subscription: &Subscription,
        amount: Decimal,
        due_date: NaiveDate,
        description: Option<&str>,
    ) -> Invoice {
        self.store
            .insert(NewInvoice {
                id: Uuid::new_v4(),
                subscription_id: subscription.id,
                condominium_id: subscription.condominium_id,
                invoice_number: None,
                amount,
                due_date,
                period_start: subscription.current_period_start,
                period_end: subscription.current_period_end,
                description: description.map(str::to_string),
            })
            .await
            .unwrap()
    }
}

pub fn test_config() -> Config {
    Config::new(ServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["http://localhost:3000".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            jwt_secret: JWT_SECRET.to_string(),
            environment: "test".to_string(),
            http_concurrency_limit: 64,
        },
        database_url: "postgres://unused".to_string(),
        billing: BillingConfig {
            payment_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            ..BillingConfig::default()
        },
    })
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(StubGateway::succeeding()).await
}

pub async fn setup_test_app_with(gateway: StubGateway) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::with_default_plans());
    let clock = Arc::new(FixedClock::default());
    let gateway = Arc::new(gateway);

    let state = build_state(
        &config,
        Stores::in_memory(store.clone()),
        gateway.clone(),
        clock.clone(),
    );
    let app = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        store,
        clock,
        gateway,
    }
}
