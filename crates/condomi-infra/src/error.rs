//! HTTP error response body
//!
//! `IntoResponse` for `AppError` lives in the API crate: neither the trait nor
//! the type is local to this crate.

use condomi_core::{AppError, ErrorMetadata};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable code, e.g. `QUOTA_EXCEEDED`
    pub code: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorResponse {
    /// Build the body for `err`. Sensitive details are withheld in production.
    pub fn from_app_error(err: &AppError, is_production: bool) -> Self {
        let expose = !is_production || !err.is_sensitive();
        Self {
            error: err.client_message(),
            code: err.error_code().to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action().map(str::to_string),
            details: expose.then(|| err.detailed_message()),
            error_type: expose.then(|| err.error_type().to_string()),
        }
    }
}
