use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{chatdb::ChatExt, marketdb::MarketExt, userdb::UserExt},
    dtos::marketdtos::PaginationQuery,
    error::HttpError,
    middleware::JWTAuthMiddleware,
    models::chatmodel::*,
    AppState,
};

pub fn chat_handler() -> Router {
    Router::new()
        .route("/conversations", get(get_user_conversations).post(create_conversation))
        .route("/conversations/:conversation_id", get(get_conversation_details))
        .route(
            "/conversations/:conversation_id/messages",
            get(get_messages).post(send_message),
        )
        .route("/conversations/:conversation_id/read", put(mark_as_read))
        .route("/unread-count", get(get_unread_count))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateConversationDto {
    pub other_user_id: Uuid,
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageDto {
    #[validate(length(min = 1, max = 5000, message = "Message must be between 1 and 5000 characters"))]
    pub content: String,

    pub message_type: Option<MessageType>,

    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ConversationParticipant {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationWithDetails {
    pub conversation: Conversation,
    pub other_user: ConversationParticipant,
}

pub async fn create_conversation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateConversationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if body.other_user_id == auth.user.id {
        return Err(HttpError::bad_request(
            "Cannot start a conversation with yourself",
        ));
    }

    let other_user = app_state
        .db_client
        .get_user(Some(body.other_user_id), None, None, None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    if let Some(job_id) = body.job_id {
        app_state
            .db_client
            .get_job_by_id(job_id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .ok_or_else(|| HttpError::not_found("Job not found"))?;
    }

    let conversation = app_state
        .db_client
        .create_or_get_conversation(auth.user.id, body.other_user_id, body.job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = ConversationWithDetails {
        conversation,
        other_user: ConversationParticipant {
            id: other_user.id,
            name: other_user.name,
            username: other_user.username,
            avatar_url: other_user.avatar_url,
        },
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": response
    })))
}

pub async fn get_user_conversations(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let page = pagination.page.unwrap_or(1);
    let limit = pagination.limit.unwrap_or(20).min(50) as i64;
    let offset = ((page - 1) as i64) * limit;

    let conversations = app_state
        .db_client
        .get_user_conversations(auth.user.id, limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": conversations
    })))
}

pub async fn get_conversation_details(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let conversation = fetch_participant_conversation(&app_state, conversation_id, auth.user.id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": conversation
    })))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    fetch_participant_conversation(&app_state, conversation_id, auth.user.id).await?;

    let message = app_state
        .db_client
        .send_message(
            conversation_id,
            auth.user.id,
            body.message_type.unwrap_or(MessageType::Text),
            body.content,
            body.metadata,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": message
    })))
}

pub async fn get_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(conversation_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    fetch_participant_conversation(&app_state, conversation_id, auth.user.id).await?;

    let page = pagination.page.unwrap_or(1);
    let limit = pagination.limit.unwrap_or(50).min(100) as i64;
    let offset = ((page - 1) as i64) * limit;

    let messages = app_state
        .db_client
        .get_conversation_messages(conversation_id, limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": messages
    })))
}

pub async fn mark_as_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    fetch_participant_conversation(&app_state, conversation_id, auth.user.id).await?;

    app_state
        .db_client
        .mark_messages_as_read(conversation_id, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Messages marked as read"
    })))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let count = app_state
        .db_client
        .get_unread_count(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "unread_count": count }
    })))
}

async fn fetch_participant_conversation(
    app_state: &Arc<AppState>,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Conversation, HttpError> {
    let conversation = app_state
        .db_client
        .get_conversation_by_id(conversation_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Conversation not found"))?;

    if conversation.participant_one_id != user_id && conversation.participant_two_id != user_id {
        return Err(HttpError::unauthorized(
            "Not a participant in this conversation",
        ));
    }

    Ok(conversation)
}
