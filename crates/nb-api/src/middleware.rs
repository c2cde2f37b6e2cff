//! nullboard-backup/crates/nb-api/src/middleware.rs Middleware
//!
//! Request logging and CORS for the backup API.

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;

// Returns the access logger used for every request.
pub fn standard_middleware() -> Logger {
    // We use the 'default' logger which outputs:
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

/// Body size limit for the raw-bytes extractor every write handler uses.
pub fn payload_config(limit: usize) -> web::PayloadConfig {
    web::PayloadConfig::new(limit)
}

// Nullboard runs from a file:// page or any origin, so CORS is wide open.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
