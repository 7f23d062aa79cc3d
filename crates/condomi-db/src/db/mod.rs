//! Data access layer
//!
//! `store` defines the traits services depend on. `postgres` implements them
//! with sqlx, pushing every check-and-write into a single statement or
//! transaction. `memory` implements them over a mutex for tests and local
//! runs.

pub mod memory;
pub mod postgres;
pub mod store;
pub mod transaction;
