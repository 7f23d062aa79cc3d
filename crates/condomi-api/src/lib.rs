//! Condomi API Library
//!
//! HTTP handlers, authentication and application setup for the billing
//! service.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;

pub mod auth;
pub mod error;
pub mod state;

pub use error::{HttpAppError, ValidatedJson};
pub use state::AppState;
