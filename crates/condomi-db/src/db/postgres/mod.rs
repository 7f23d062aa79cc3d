//! PostgreSQL repositories

mod access;
mod condominium;
mod invoice;
mod plan;
mod subscription;

pub use access::AccessRepository;
pub use condominium::CondominiumRepository;
pub use invoice::InvoiceRepository;
pub use plan::PlanRepository;
pub use subscription::SubscriptionRepository;

pub(crate) const PLAN_COLUMNS: &str = "id, tier, name, notifications_limit, warnings_limit, \
     fines_limit, package_notifications_limit, price, is_active, created_at, updated_at";

pub(crate) const SUBSCRIPTION_COLUMNS: &str = "id, condominium_id, plan, is_active, is_trial, \
     trial_ends_at, is_lifetime, current_period_start, current_period_end, \
     notifications_limit, notifications_used, warnings_limit, warnings_used, \
     fines_limit, fines_used, package_notifications_limit, package_notifications_extra, \
     package_notifications_used, created_at, updated_at";

pub(crate) const INVOICE_COLUMNS: &str = "id, subscription_id, condominium_id, invoice_number, \
     amount, due_date, period_start, period_end, status, paid_at, payment_method, \
     payment_reference, description, created_at, updated_at";
