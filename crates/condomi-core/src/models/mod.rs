//! Data models for the billing core
//!
//! Each sub-module represents one domain area; everything is re-exported
//! here for convenient imports.

mod condominium;
mod invoice;
mod pix;
mod plan;
mod role;
mod subscription;

pub use condominium::*;
pub use invoice::*;
pub use pix::*;
pub use plan::*;
pub use role::*;
pub use subscription::*;
