//! rusty-forum/crates/rf-api/src/middleware.rs Middleware
//!
//! Custom middleware for security and logging.

use actix_web::middleware::{DefaultHeaders, Logger, NormalizePath};

/// Returns the access logger for the Rusty-Forum API.
pub fn standard_middleware() -> Logger {
    // We use the 'default' logger which outputs:
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

/// Strips trailing slashes so `/login/` and `/login` hit the same route.
pub fn normalize_path() -> NormalizePath {
    NormalizePath::trim()
}

/// Security headers added to every response.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add(("X-Frame-Options", "DENY"))
}
