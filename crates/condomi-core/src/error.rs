//! Error types module
//!
//! All failures surfaced by the billing core are unified under [`AppError`].
//! Quota and invoice-lifecycle violations are terminal for the attempted
//! operation; remote and database failures are reported as recoverable so the
//! caller may retry.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for business-rule rejections such as exhausted quota
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "QUOTA_EXCEEDED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Quota exceeded for {resource}: {used} used + {requested} requested > {capacity} available")]
    QuotaExceeded {
        resource: String,
        used: i32,
        requested: i32,
        capacity: i32,
    },

    #[error("Billing period ended at {period_end}")]
    PeriodExpired { period_end: DateTime<Utc> },

    #[error("Subscription inactive for condominium {condominium_id}")]
    SubscriptionInactive { condominium_id: Uuid },

    #[error("No subscription found for condominium {condominium_id}")]
    NoSubscriptionFound { condominium_id: Uuid },

    #[error("Invoice {invoice_id} is already paid")]
    AlreadyPaid {
        invoice_id: Uuid,
        paid_at: Option<DateTime<Utc>>,
    },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check the authentication token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            Some("Ask an administrator for the required role"),
            false,
            LogLevel::Debug,
        ),
        AppError::QuotaExceeded { .. } => (
            402,
            "QUOTA_EXCEEDED",
            false,
            Some("Upgrade the plan or wait for the next billing period"),
            false,
            LogLevel::Warn,
        ),
        AppError::PeriodExpired { .. } => (
            409,
            "PERIOD_EXPIRED",
            false,
            Some("Roll the subscription over to the current period and retry"),
            false,
            LogLevel::Warn,
        ),
        AppError::SubscriptionInactive { .. } => (
            402,
            "SUBSCRIPTION_INACTIVE",
            false,
            Some("Reactivate the subscription to use this feature"),
            false,
            LogLevel::Debug,
        ),
        AppError::NoSubscriptionFound { .. } => (
            404,
            "NO_SUBSCRIPTION_FOUND",
            false,
            Some("Create a subscription for this condominium first"),
            false,
            LogLevel::Debug,
        ),
        AppError::AlreadyPaid { .. } => (
            409,
            "ALREADY_PAID",
            false,
            Some("No action needed; issue a new invoice for corrections"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidDocument(_) => (
            422,
            "INVALID_DOCUMENT",
            false,
            Some("Check the CPF/CNPJ number and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::RemoteUnavailable(_) => (
            503,
            "REMOTE_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::QuotaExceeded { .. } => "QuotaExceeded",
            AppError::PeriodExpired { .. } => "PeriodExpired",
            AppError::SubscriptionInactive { .. } => "SubscriptionInactive",
            AppError::NoSubscriptionFound { .. } => "NoSubscriptionFound",
            AppError::AlreadyPaid { .. } => "AlreadyPaid",
            AppError::InvalidDocument(_) => "InvalidDocument",
            AppError::RemoteUnavailable(_) => "RemoteUnavailable",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::QuotaExceeded {
                resource,
                used,
                requested,
                capacity,
            } => format!(
                "Quota exhausted for {}: {} of {} used, {} more requested",
                resource, used, capacity, requested
            ),
            AppError::PeriodExpired { period_end } => format!(
                "The billing period ended at {}; the subscription must be rolled over",
                period_end.to_rfc3339()
            ),
            AppError::SubscriptionInactive { .. } => {
                "The condominium subscription is inactive".to_string()
            }
            AppError::NoSubscriptionFound { .. } => {
                "The condominium has no subscription".to_string()
            }
            AppError::AlreadyPaid { .. } => "This invoice is already paid".to_string(),
            AppError::InvalidDocument(ref msg) => msg.clone(),
            AppError::RemoteUnavailable(_) => "Payment gateway unavailable".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
