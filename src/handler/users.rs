use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::{
        marketdtos::PaginationQuery,
        userdtos::*,
    },
    error::HttpError,
    middleware::JWTAuthMiddleware,
    models::usermodel::UserRole,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me).put(update_profile))
        .route("/", get(get_users))
        .route("/:user_id/role", put(update_user_role))
}

pub async fn get_me(
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let filtered_user = FilterUserDto::filter_user(&auth.user);

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: filtered_user,
        },
    }))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateUserProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .update_user_profile(
            auth.user.id,
            body.name,
            body.phone_number,
            body.location_state,
            body.location_city,
            body.avatar_url,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let filtered_user = FilterUserDto::filter_user(&user);

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: filtered_user,
        },
    }))
}

// Admin listing of registered users
pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    if auth.user.role != UserRole::Admin {
        return Err(HttpError::forbidden(
            "Only admins can list users".to_string(),
        ));
    }

    let page = pagination.page.unwrap_or(1);
    let limit = pagination.limit.unwrap_or(20).min(50) as usize;

    let users = app_state
        .db_client
        .get_users(page, limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let filtered: Vec<FilterUserDto> = users.iter().map(FilterUserDto::filter_user).collect();

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "users": filtered },
        "page": page,
        "limit": limit,
    })))
}

pub async fn update_user_role(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, HttpError> {
    if auth.user.role != UserRole::Admin {
        return Err(HttpError::forbidden(
            "Only admins can change roles".to_string(),
        ));
    }

    let role = match body.get("role").and_then(|r| r.as_str()) {
        Some("admin") => UserRole::Admin,
        Some("support") => UserRole::Support,
        Some("client") => UserRole::Client,
        Some("professional") => UserRole::Professional,
        _ => return Err(HttpError::bad_request("Invalid role".to_string())),
    };

    let user = app_state
        .db_client
        .update_user_role(user_id, role)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let filtered_user = FilterUserDto::filter_user(&user);

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: filtered_user,
        },
    }))
}
