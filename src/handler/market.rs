// handler/market.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::marketdb::MarketExt,
    dtos::marketdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddleware,
    models::marketmodel::*,
    AppState,
};

pub fn market_handler() -> Router {
    Router::new()
        // Professional profiles
        .route("/professionals/profile", post(create_professional_profile))
        .route("/professionals/profile", get(get_own_professional_profile))
        .route("/professionals/profile", put(update_professional_profile))
        .route(
            "/professionals/profile/availability",
            put(update_availability),
        )
        .route("/professionals/search", get(search_professionals))
        // Service requests
        .route("/requests", post(create_request).get(search_requests))
        .route("/requests/mine", get(get_my_requests))
        .route("/requests/:request_id", get(get_request_details))
        .route("/requests/:request_id/cancel", put(cancel_request))
        // Offers
        .route(
            "/requests/:request_id/offers",
            post(submit_offer).get(get_request_offers),
        )
        .route("/offers/mine", get(get_my_offers))
        .route("/offers/:offer_id/accept", post(accept_offer))
        .route("/offers/:offer_id/withdraw", put(withdraw_offer))
}

// Professional profile handlers
pub async fn create_professional_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateProfessionalProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let existing = app_state
        .db_client
        .get_professional_profile(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing.is_some() {
        return Err(HttpError::bad_request("Professional profile already exists"));
    }

    let profile = app_state
        .db_client
        .create_professional_profile(
            auth.user.id,
            body.category,
            body.bio,
            body.hourly_rate,
            body.location_state,
            body.location_city,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Professional profile created successfully",
        profile,
    )))
}

pub async fn get_own_professional_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .db_client
        .get_professional_profile(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Professional profile not found"))?;

    Ok(Json(ApiResponse::success(
        "Professional profile retrieved successfully",
        profile,
    )))
}

pub async fn update_professional_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateProfessionalProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state
        .db_client
        .get_professional_profile(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Professional profile not found"))?;

    let updated = app_state
        .db_client
        .update_professional_profile(
            profile.id,
            body.category,
            body.bio,
            body.hourly_rate,
            body.location_state,
            body.location_city,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Professional profile updated successfully",
        updated,
    )))
}

pub async fn update_availability(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateAvailabilityDto>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .db_client
        .get_professional_profile(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Professional profile not found"))?;

    let updated = app_state
        .db_client
        .update_professional_availability(profile.id, body.is_available)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Availability updated successfully",
        updated,
    )))
}

pub async fn search_professionals(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<SearchProfessionalsDto>,
) -> Result<impl IntoResponse, HttpError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20).min(50) as i64;
    let offset = ((page - 1) as i64) * limit;

    let professionals = app_state
        .db_client
        .search_professionals(
            query.category,
            query.location_state.as_deref(),
            query.location_city.as_deref(),
            limit,
            offset,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(PaginatedResponse::new(professionals, page, limit as u32)))
}

// Service request handlers
pub async fn create_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateServiceRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state
        .market_service
        .create_request(auth.user.id, body)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Service request created successfully",
        request,
    )))
}

pub async fn search_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<SearchRequestsDto>,
) -> Result<impl IntoResponse, HttpError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20).min(50) as i64;
    let offset = ((page - 1) as i64) * limit;

    let requests = app_state
        .db_client
        .search_service_requests(
            query.category,
            query.location_state.as_deref(),
            RequestStatus::Open,
            limit,
            offset,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(PaginatedResponse::new(requests, page, limit as u32)))
}

pub async fn get_my_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let requests = app_state
        .db_client
        .get_client_requests(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Requests retrieved successfully",
        requests,
    )))
}

pub async fn get_request_details(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .db_client
        .get_service_request_by_id(request_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Service request not found"))?;

    Ok(Json(ApiResponse::success(
        "Request retrieved successfully",
        request,
    )))
}

pub async fn cancel_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .db_client
        .get_service_request_by_id(request_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Service request not found"))?;

    if request.client_id != auth.user.id {
        return Err(HttpError::unauthorized(
            "Not authorized to cancel this request",
        ));
    }

    let cancelled = app_state
        .db_client
        .cancel_service_request(request_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::bad_request("Only an open request can be cancelled"))?;

    Ok(Json(ApiResponse::success(
        "Request cancelled successfully",
        cancelled,
    )))
}

// Offer handlers
pub async fn submit_offer(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<CreateOfferDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let offer = app_state
        .market_service
        .submit_offer(request_id, auth.user.id, body)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Offer submitted successfully",
        offer,
    )))
}

pub async fn get_request_offers(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .db_client
        .get_service_request_by_id(request_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Service request not found"))?;

    // Offers carry pricing, only the request owner sees them
    if request.client_id != auth.user.id {
        return Err(HttpError::unauthorized(
            "Not authorized to view offers for this request",
        ));
    }

    let offers = app_state
        .db_client
        .get_offers_for_request(request_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Offers retrieved successfully",
        offers,
    )))
}

pub async fn get_my_offers(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let offers = app_state
        .db_client
        .get_professional_offers(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Offers retrieved successfully",
        offers,
    )))
}

pub async fn accept_offer(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(offer_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state
        .market_service
        .accept_offer(offer_id, auth.user.id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Offer accepted, job created",
        result,
    )))
}

pub async fn withdraw_offer(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(offer_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let offer = app_state
        .market_service
        .withdraw_offer(offer_id, auth.user.id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Offer withdrawn successfully",
        offer,
    )))
}
