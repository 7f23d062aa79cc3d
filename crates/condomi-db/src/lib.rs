//! Condomi Database Layer
//!
//! Store traits for plans, condominiums, subscriptions, invoices and role
//! lookups, with a PostgreSQL implementation and an in-memory one that
//! enforces the same atomicity rules.

pub mod db;

// Re-exports: store traits and the bundle services are built from
pub use db::store::{
    AccessStore, CondominiumStore, InvoiceStore, PlanStore, Stores, SubscriptionStore,
};

// Re-exports: PostgreSQL repositories
pub use db::postgres::{
    AccessRepository, CondominiumRepository, InvoiceRepository, PlanRepository,
    SubscriptionRepository,
};

// Re-exports: in-memory store
pub use db::memory::MemoryStore;

// Re-exports: Transaction utilities
pub use db::transaction::{with_transaction, TransactionGuard};
