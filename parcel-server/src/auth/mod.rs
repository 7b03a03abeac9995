//! Admin authentication and request rate limiting

pub mod admin_auth;
pub mod rate_limit;

pub use admin_auth::{AdminCredentials, AdminIdentity, admin_auth_middleware};
pub use rate_limit::RateLimiter;
