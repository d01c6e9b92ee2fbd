use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::application::ChatService;
use crate::config::{AuthConfig, SecurityConfig};
use crate::error::{AppError, AppResult};
use crate::observability::AppMetrics;
use sqlx::PgPool;

pub mod chat;
pub mod ws;

#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
    pub app_environment: String,
    pub metrics: Arc<AppMetrics>,
    pub db_pool: Option<PgPool>,
    pub ws_hub: ws::WsConnectionHub,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chat")
            .configure(ws::configure)
            .configure(chat::configure),
    )
    .route("/health", web::get().to(health))
    .route("/ready", web::get().to(ready))
    .route("/metrics", web::get().to(metrics));
}

async fn health() -> &'static str {
    "ok"
}

async fn ready(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let pool = state
        .db_pool
        .as_ref()
        .ok_or_else(|| AppError::database_unavailable("Service not ready: no database pool"))?;

    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::database_unavailable(format!("Service not ready: {e}")))?;
    Ok(HttpResponse::Ok().body("ready"))
}

async fn metrics(state: web::Data<AppState>, request: HttpRequest) -> AppResult<HttpResponse> {
    let admin_authorized = state
        .security
        .metrics_admin_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .is_some_and(|token| {
            request
                .headers()
                .get("x-admin-token")
                .and_then(|value| value.to_str().ok())
                == Some(token)
        });

    if !admin_authorized && state.security.metrics_allow_private_only {
        let ip = request
            .peer_addr()
            .map(|addr| addr.ip())
            .ok_or(AppError::Unauthorized)?;

        if !is_private_or_loopback(ip) {
            return Err(AppError::Unauthorized);
        }
    }

    let (db_size, db_idle) = pool_stats(&state);
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(state.metrics.render_prometheus(db_size, db_idle)))
}

fn is_private_or_loopback(ip: std::net::IpAddr) -> bool {
    match ip {
        std::net::IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        std::net::IpAddr::V6(v6) => v6.is_loopback() || v6.is_unique_local(),
    }
}

fn pool_stats(state: &web::Data<AppState>) -> (u32, usize) {
    state
        .db_pool
        .as_ref()
        .map_or((0, 0), |pool| (pool.size(), pool.num_idle()))
}
