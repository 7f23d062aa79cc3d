//! Configuration module
//!
//! Environment-driven configuration for the billing service: server and
//! database settings, authentication, payment gateway access and invoice
//! defaults.

use std::env;

use crate::models::{InvoiceSortField, ListPreferences, SortDirection};

const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 256;
const GATEWAY_TIMEOUT_SECS: u64 = 15;
const INVOICE_DUE_DAYS: u32 = 10;
const INVOICE_NUMBER_PREFIX: &str = "FAT";
const MIN_SECRET_LENGTH: usize = 32;

/// Settings shared by every HTTP-facing process
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
    pub http_concurrency_limit: usize,
}

/// Billing-specific settings
#[derive(Clone, Debug)]
pub struct BillingConfig {
    /// Base URL of the payment gateway (PIX charges). `None` disables PIX.
    pub payment_gateway_url: Option<String>,
    pub payment_gateway_token: Option<String>,
    pub payment_gateway_timeout_seconds: u64,
    /// Shared secret for HMAC-signed payment confirmations.
    pub payment_webhook_secret: Option<String>,
    /// Days after the period start a recurring invoice falls due.
    pub invoice_due_days: u32,
    pub invoice_number_prefix: String,
    pub default_sort: InvoiceSortField,
    pub default_sort_direction: SortDirection,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            payment_gateway_url: None,
            payment_gateway_token: None,
            payment_gateway_timeout_seconds: GATEWAY_TIMEOUT_SECS,
            payment_webhook_secret: None,
            invoice_due_days: INVOICE_DUE_DAYS,
            invoice_number_prefix: INVOICE_NUMBER_PREFIX.to_string(),
            default_sort: InvoiceSortField::DueDate,
            default_sort_direction: SortDirection::Desc,
        }
    }
}

impl BillingConfig {
    pub fn default_list_preferences(&self) -> ListPreferences {
        ListPreferences {
            sort_by: self.default_sort,
            direction: self.default_sort_direction,
        }
    }

    fn from_env() -> Result<Self, anyhow::Error> {
        let default_sort = match env::var("INVOICE_DEFAULT_SORT") {
            Ok(v) => v
                .parse::<InvoiceSortField>()
                .map_err(|e| anyhow::anyhow!("INVOICE_DEFAULT_SORT: {}", e))?,
            Err(_) => InvoiceSortField::DueDate,
        };
        let default_sort_direction = match env::var("INVOICE_DEFAULT_SORT_DIRECTION") {
            Ok(v) => v
                .parse::<SortDirection>()
                .map_err(|e| anyhow::anyhow!("INVOICE_DEFAULT_SORT_DIRECTION: {}", e))?,
            Err(_) => SortDirection::Desc,
        };

        Ok(Self {
            payment_gateway_url: env::var("PAYMENT_GATEWAY_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            payment_gateway_token: env::var("PAYMENT_GATEWAY_TOKEN").ok(),
            payment_gateway_timeout_seconds: env::var("PAYMENT_GATEWAY_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(GATEWAY_TIMEOUT_SECS),
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").ok(),
            invoice_due_days: env::var("INVOICE_DUE_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(INVOICE_DUE_DAYS),
            invoice_number_prefix: env::var("INVOICE_NUMBER_PREFIX")
                .unwrap_or_else(|_| INVOICE_NUMBER_PREFIX.to_string()),
            default_sort,
            default_sort_direction,
        })
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(ref secret) = self.payment_webhook_secret {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(anyhow::anyhow!(
                    "PAYMENT_WEBHOOK_SECRET must be at least {} characters long",
                    MIN_SECRET_LENGTH
                ));
            }
        }
        if let Some(ref url) = self.payment_gateway_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(anyhow::anyhow!("PAYMENT_GATEWAY_URL must be an http(s) URL"));
            }
        }
        if self.payment_gateway_timeout_seconds == 0 {
            return Err(anyhow::anyhow!(
                "PAYMENT_GATEWAY_TIMEOUT_SECONDS must be greater than zero"
            ));
        }
        if self.invoice_number_prefix.trim().is_empty() {
            return Err(anyhow::anyhow!("INVOICE_NUMBER_PREFIX must not be empty"));
        }
        Ok(())
    }
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub billing: BillingConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
        };

        Ok(Self {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            billing: BillingConfig::from_env()?,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_SECRET_LENGTH
            ));
        }
        if !(self.database_url.starts_with("postgresql://")
            || self.database_url.starts_with("postgres://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }
        if self.base.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be greater than zero"));
        }
        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be greater than zero"));
        }
        if is_production_env(&self.base.environment) && self.billing.payment_webhook_secret.is_none()
        {
            return Err(anyhow::anyhow!(
                "PAYMENT_WEBHOOK_SECRET must be set in production"
            ));
        }
        self.billing.validate()
    }
}

fn is_production_env(environment: &str) -> bool {
    matches!(environment.to_lowercase().as_str(), "production" | "prod")
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    pub fn new(config: ServiceConfig) -> Self {
        Config(Box::new(config))
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config::new(ServiceConfig::from_env()?))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn billing(&self) -> &BillingConfig {
        &self.inner().billing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_config() -> ServiceConfig {
        ServiceConfig {
            base: BaseConfig {
                server_port: 4000,
                cors_origins: vec!["https://app.example.com".to_string()],
                db_max_connections: 5,
                db_timeout_seconds: 5,
                jwt_secret: "x".repeat(40),
                environment: "development".to_string(),
                http_concurrency_limit: 64,
            },
            database_url: "postgres://localhost/condomi".to_string(),
            billing: BillingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(Config::new(service_config()).validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = service_config();
        config.base.jwt_secret = "short".to_string();
        assert!(Config::new(config).validate().is_err());
    }

    #[test]
    fn test_production_requires_webhook_secret() {
        let mut config = service_config();
        config.base.environment = "PROD".to_string();
        let config = Config::new(config);
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_list_preferences() {
        let prefs = BillingConfig::default().default_list_preferences();
        assert_eq!(prefs.sort_by, InvoiceSortField::DueDate);
        assert_eq!(prefs.direction, SortDirection::Desc);
    }
}
