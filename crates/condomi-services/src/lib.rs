//! Condomi Services Layer
//!
//! Business services over the store traits: usage-limit enforcement, the
//! invoice lifecycle, PIX charge generation, role-based authorization and
//! subscription onboarding / rollover. The API crate depends on this facade
//! and keeps HTTP handling thin.

pub mod services;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use services::authorization::{Action, Authorizer};
pub use services::clock::{Clock, SystemClock};
pub use services::gateway::{DisabledGateway, HttpPaymentGateway, PaymentGateway};
pub use services::invoice::InvoiceService;
pub use services::pix::PixService;
pub use services::plan::PlanService;
pub use services::subscription::SubscriptionService;
pub use services::usage::UsageLimitService;
pub use services::BillingServices;
