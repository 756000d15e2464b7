// routes.rs
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        auth::auth_handler,
        chat::chat_handler,
        jobs::{disputes_admin_handler, jobs_handler},
        market::market_handler,
        notifications::notifications_handler,
        users::users_handler,
        webhooks::webhooks_handler,
    },
    middleware::{auth, rate_limit::rate_limit_middleware, role_check, RateLimiter},
    models::usermodel::UserRole,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Login and registration share one sliding window per client IP
    let auth_limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(3600)));

    let auth_routes = auth_handler().layer(middleware::from_fn_with_state(
        auth_limiter,
        rate_limit_middleware,
    ));

    let admin_dispute_routes = disputes_admin_handler()
        .layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::Admin])
        }))
        .layer(middleware::from_fn(auth));

    let api_route = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest("/market", market_handler().layer(middleware::from_fn(auth)))
        .merge(jobs_handler().layer(middleware::from_fn(auth)))
        .nest("/disputes", admin_dispute_routes)
        .nest("/chat", chat_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/notifications",
            notifications_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/webhooks", webhooks_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
