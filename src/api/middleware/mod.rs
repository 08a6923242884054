//! API middleware components

pub mod auth;
pub mod logging;
pub mod rate_limit;
pub mod security;

pub use auth::RequireApiKey;
pub use logging::logging_middleware;
pub use rate_limit::rate_limit_middleware;
pub use security::security_headers_middleware;
