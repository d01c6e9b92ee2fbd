use std::sync::Arc;
use std::time::Instant;

use actix_web::dev::Service as _;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{web, App, HttpServer};
use marketplace_chat::api::routes::{self, ws, AppState};
use marketplace_chat::application::{ChatEvents, ChatService};
use marketplace_chat::config::AppConfig;
use marketplace_chat::infrastructure::db::{migrations::run_migrations, pool::create_pool};
use marketplace_chat::infrastructure::repositories::{
    ChatRepositoryImpl, ListingRepositoryImpl, RatingRepositoryImpl,
};
use marketplace_chat::middleware::request_logging::{
    get_client_ip, get_status_class, get_user_agent, get_user_id_from_request,
};
use marketplace_chat::observability::error_tracking::capture_unexpected_5xx;
use marketplace_chat::observability::AppMetrics;
use marketplace_chat::security::{cors_middleware, security_headers};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

fn startup_error(context: &str, error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {error}"))
}

fn init_tracing(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .init();
    } else {
        registry.with(fmt::layer().pretty()).init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()
        .map_err(|e| startup_error("failed to load application configuration", e))?;
    config
        .validate()
        .map_err(|e| startup_error("invalid application configuration", e))?;

    init_tracing(&config.logging.level, config.logging.json_format);

    let pool = create_pool(&config.database)
        .await
        .map_err(|e| startup_error("failed to create database pool", e))?;

    run_migrations(&pool)
        .await
        .map_err(|e| startup_error("database migrations failed", e))?;

    let events = ChatEvents::new(config.chat.event_bus_capacity);
    let chat_service = Arc::new(ChatService::new(
        Arc::new(ChatRepositoryImpl::new(pool.clone())),
        Arc::new(ListingRepositoryImpl::new(pool.clone())),
        Arc::new(RatingRepositoryImpl::new(pool.clone())),
        events.clone(),
        config.chat.clone(),
    ));

    let state = AppState {
        chat_service,
        auth: config.auth.clone(),
        security: config.security.clone(),
        app_environment: config.environment.clone(),
        metrics: Arc::new(AppMetrics::default()),
        db_pool: Some(pool.clone()),
        ws_hub: ws::WsConnectionHub::default(),
    };

    ws::spawn_relay(&events, state.ws_hub.clone(), state.metrics.clone());

    let bind_host = config.host.clone();
    let bind_port = config.port;
    let security_config = config.security.clone();
    let metrics = state.metrics.clone();

    info!(
        host = %bind_host,
        port = bind_port,
        environment = %config.environment,
        "starting marketplace chat service"
    );

    HttpServer::new(move || {
        let metrics = metrics.clone();
        App::new()
            .wrap_fn(move |req, srv| {
                let request_id = Uuid::new_v4().to_string();
                let path = req.path().to_string();
                let method = req.method().to_string();
                let client_ip = get_client_ip(&req);
                let user_agent = get_user_agent(&req);
                let metrics = metrics.clone();
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    let mut response = fut.await?;
                    response.headers_mut().insert(
                        HeaderName::from_static("x-request-id"),
                        HeaderValue::from_str(&request_id)
                            .unwrap_or_else(|_| HeaderValue::from_static("invalid-request-id")),
                    );

                    let status = response.status().as_u16();
                    let latency_ms = start.elapsed().as_millis() as u64;
                    metrics.record_request(status, latency_ms);

                    info!(
                        request_id = %request_id,
                        method = %method,
                        path = %path,
                        status = status,
                        status_class = get_status_class(status),
                        latency_ms = latency_ms,
                        user_id = %get_user_id_from_request(response.request()),
                        client_ip = %client_ip,
                        user_agent = %user_agent,
                        "request completed"
                    );

                    capture_unexpected_5xx(&path, &method, status, &request_id);
                    Ok(response)
                }
            })
            .wrap(cors_middleware(&security_config))
            .wrap(security_headers())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind((bind_host, bind_port))?
    .run()
    .await
}
