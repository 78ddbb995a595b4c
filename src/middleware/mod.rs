//! Middleware chain executed before handlers.

mod core;
mod cors;
mod rate_limit;

pub use core::Middleware;
pub use cors::CorsMiddleware;
pub use rate_limit::RateLimitMiddleware;
