pub mod condominiums;
pub mod health;
pub mod invoices;
pub mod pix;
pub mod plans;
pub mod usage;
pub mod webhooks;
