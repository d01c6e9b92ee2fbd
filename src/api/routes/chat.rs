use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::api::dtos::{CreateConversationRequest, MessageListQuery, SendMessageRequest};
use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        AppError::BadRequest(format!("invalid request body: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
        AppError::BadRequest(format!("invalid query string: {err}")).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|_, _| {
        AppError::BadRequest("invalid identifier in path".to_string()).into()
    }))
    .service(
        web::scope("/conversations")
            .route("", web::post().to(create_conversation))
            .route("/{id}", web::get().to(get_conversation))
            .route("/{id}/messages", web::get().to(list_messages))
            .route("/{id}/messages", web::post().to(send_message)),
    )
    .route(
        "/users/{user_id}/conversations",
        web::get().to(list_user_conversations),
    );
}

async fn create_conversation(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    payload: web::Json<CreateConversationRequest>,
) -> AppResult<HttpResponse> {
    let result = state
        .chat_service
        .create_conversation(caller.user_id(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn get_conversation(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let result = state
        .chat_service
        .get_conversation(caller.user_id(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn list_user_conversations(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let result = state
        .chat_service
        .list_conversations(caller.user_id(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn list_messages(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
    query: web::Query<MessageListQuery>,
) -> AppResult<HttpResponse> {
    let result = state
        .chat_service
        .list_messages(caller.user_id(), path.into_inner(), query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn send_message(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
    payload: web::Json<SendMessageRequest>,
) -> AppResult<HttpResponse> {
    let result = state
        .chat_service
        .send_message(caller.user_id(), path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}
