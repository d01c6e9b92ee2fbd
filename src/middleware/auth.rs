use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::validate_token;

/// Caller identity verified from the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub const fn user_id(&self) -> Uuid {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<AppResult<Self>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

pub fn authenticate(req: &HttpRequest) -> AppResult<AuthenticatedUser> {
    if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
        return Ok(*user);
    }

    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("missing AppState app data"))
    })?;

    let token = bearer_token(req)
        .or_else(|| cookie_token(req, &state.auth.session_cookie_name))
        .ok_or(AppError::Unauthorized)?;

    let result = validate_token(&token, &state.auth);
    if result.is_err() {
        state.metrics.record_auth_failure();
    }
    let user = AuthenticatedUser(result?.sub);
    req.extensions_mut().insert(user);
    Ok(user)
}

/// Token from an `Authorization: Bearer <token>` header; the scheme is
/// matched case-insensitively.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

fn cookie_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    req.cookie(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
