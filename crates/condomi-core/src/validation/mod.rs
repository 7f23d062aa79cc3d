//! Validation modules

pub mod document;

pub use document::{normalize_digits, validate_cnpj, validate_cpf, validate_document};
