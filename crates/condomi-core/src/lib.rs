//! Condomi Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and the
//! pure billing rules (derived invoice status, statistics, discount
//! reconstruction, quota arithmetic) shared by every Condomi component.

pub mod billing;
pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, BillingConfig, Config, ServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
