use actix_web::dev::ServiceRequest;
use actix_web::http::header;
use actix_web::{HttpMessage, HttpRequest};

use crate::middleware::auth::AuthenticatedUser;

/// User id recorded by the auth extractor, or `anonymous`.
pub fn get_user_id_from_request(req: &HttpRequest) -> String {
    req.extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.user_id().to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Peer address as resolved by actix; forwarded headers are only honoured
/// when actix is configured to trust them.
pub fn get_client_ip(req: &ServiceRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn get_user_agent(req: &ServiceRequest) -> String {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

pub fn get_status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "unknown",
    }
}
