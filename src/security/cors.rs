use crate::config::SecurityConfig;
use actix_cors::Cors;
use actix_web::http::header;

/// Browser access is limited to the configured frontend origins; the chat API
/// only exposes GET and POST.
pub fn cors_middleware(config: &SecurityConfig) -> Cors {
    let allowlist = config.cors_allowed_origins.clone();

    Cors::default()
        .supports_credentials()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(600)
        .allowed_origin_fn(move |origin, _| {
            origin
                .to_str()
                .map(|value| allowlist.iter().any(|allowed| allowed == value))
                .unwrap_or(false)
        })
}
