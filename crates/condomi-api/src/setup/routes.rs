//! Route configuration and setup

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use condomi_core::Config;
use condomi_infra::{request_id_middleware, security_headers_middleware};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa_rapidoc::RapiDoc;

use crate::auth::{auth_middleware, AuthState};
use crate::constants::{API_PREFIX, MAX_BODY_BYTES};
use crate::handlers::{condominiums, health, invoices, pix, plans, usage, webhooks};
use crate::state::AppState;

/// Build the full router with middleware applied.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        verifier: state.jwt.clone(),
    });

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/webhooks/payment", post(webhooks::payment_webhook));

    let protected_routes = Router::new()
        .route("/plans", get(plans::list_plans))
        .route("/plans/{tier}", put(plans::update_plan))
        .route("/condominiums", post(condominiums::create_condominium))
        .route("/condominiums/{id}/rollover", post(condominiums::rollover))
        .route("/condominiums/{id}/usage", get(usage::get_usage))
        .route("/condominiums/{id}/usage/{kind}", post(usage::consume))
        .route("/invoices", get(invoices::list_invoices))
        .route("/invoices/stats", get(invoices::invoice_statistics))
        .route("/invoices/adhoc", post(invoices::create_adhoc_invoice))
        .route("/invoices/{id}", get(invoices::get_invoice))
        .route("/invoices/{id}/payment", post(invoices::record_payment))
        .route("/invoices/{id}/pix", post(pix::generate_pix))
        .route_layer(from_fn_with_state(auth_state, auth_middleware));

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(http_concurrency_limit, "HTTP concurrency limit layer enabled");

    let openapi_path = format!("{}/openapi.json", API_PREFIX);
    let docs = RapiDoc::with_openapi(openapi_path, crate::api_doc::get_openapi_spec())
        .path(format!("{}/docs", API_PREFIX));

    let app = Router::new()
        .nest(API_PREFIX, public_routes.merge(protected_routes))
        .merge(docs)
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];
    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    };
    Ok(cors)
}
