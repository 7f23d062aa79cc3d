//! Bearer-token authentication
//!
//! Tokens are HS256 JWTs whose `sub` is the user id. Roles are not carried in
//! the token; they are looked up per request through the access store.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{JwtClaims, JwtVerifier};
pub use middleware::{auth_middleware, AuthState};
pub use models::UserContext;
