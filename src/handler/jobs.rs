// handler/jobs.rs
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
    db::{escrowdb::EscrowExt, marketdb::MarketExt},
    dtos::marketdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddleware,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/jobs/mine", get(get_my_jobs))
        .route("/jobs/:job_id", get(get_job_details))
        // Escrow lifecycle
        .route("/jobs/:job_id/fund", post(fund_job))
        .route("/jobs/:job_id/deliver", post(mark_delivered))
        .route("/jobs/:job_id/release", post(release_funds))
        .route("/jobs/:job_id/refund", post(refund))
        .route("/jobs/:job_id/escrow", get(get_job_escrow))
        // Disputes
        .route("/jobs/:job_id/dispute", post(create_dispute))
}

// Admin-only dispute routes; routes.rs layers the role check on top
pub fn disputes_admin_handler() -> Router {
    Router::new()
        .route("/open", get(get_open_disputes))
        .route("/:dispute_id/resolve", put(resolve_dispute))
}

pub async fn get_my_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let as_client = app_state
        .db_client
        .get_jobs_for_client(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let as_professional = app_state
        .db_client
        .get_jobs_for_professional(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "as_client": as_client,
            "as_professional": as_professional,
        }
    })))
}

pub async fn get_job_details(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .db_client
        .get_job_by_id(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    if job.client_id != auth.user.id && job.professional_id != auth.user.id {
        return Err(HttpError::unauthorized("Not a party to this job"));
    }

    let escrow = app_state
        .db_client
        .get_escrow_by_job_id(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let dispute = app_state
        .db_client
        .get_open_dispute_for_job(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Job retrieved successfully",
        JobDetailsDto {
            job,
            escrow,
            dispute,
        },
    )))
}

/// Client authorizes the agreed price; the hold is mirrored locally as
/// `funds_held` and the checkout secret goes back to the browser.
pub async fn fund_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state
        .escrow_service
        .fund_job(job_id, auth.user.id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Job funded, authorization held",
        FundJobResponseDto {
            escrow: result.escrow,
            client_secret: result.client_secret,
        },
    )))
}

pub async fn mark_delivered(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let escrow = app_state
        .escrow_service
        .mark_delivered(job_id, auth.user.id)
        .await
        .map_err(HttpError::from)?;

    if let Ok(Some(job)) = app_state.db_client.get_job_by_id(job_id).await {
        let _ = app_state
            .notification_service
            .notify_work_delivered(job.client_id, &job)
            .await;
    }

    Ok(Json(ApiResponse::success(
        "Work marked as delivered",
        escrow,
    )))
}

pub async fn release_funds(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let escrow = app_state
        .escrow_service
        .release_funds(job_id, auth.user.id)
        .await
        .map_err(HttpError::from)?;

    let _ = app_state
        .notification_service
        .notify_funds_released(escrow.professional_id, &escrow)
        .await;

    // Completed work feeds the professional's public stats
    if let Ok(Some(profile)) = app_state
        .db_client
        .get_professional_profile(escrow.professional_id)
        .await
    {
        let _ = app_state.db_client.bump_completed_jobs(profile.id).await;
    }

    Ok(Json(ApiResponse::success("Funds released", escrow)))
}

pub async fn refund(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let escrow = app_state
        .escrow_service
        .refund(job_id, auth.user.id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Authorization cancelled, funds returned",
        escrow,
    )))
}

pub async fn get_job_escrow(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .db_client
        .get_job_by_id(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    if job.client_id != auth.user.id && job.professional_id != auth.user.id {
        return Err(HttpError::unauthorized("Not a party to this job"));
    }

    let escrow = app_state
        .db_client
        .get_escrow_by_job_id(job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job is not funded"))?;

    Ok(Json(ApiResponse::success(
        "Escrow retrieved successfully",
        escrow,
    )))
}

pub async fn create_dispute(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<CreateDisputeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .dispute_service
        .create_dispute(job_id, auth.user.id, body.reason, body.description)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Dispute opened, payments frozen",
        result,
    )))
}

pub async fn get_open_disputes(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let page = pagination.page.unwrap_or(1);
    let limit = pagination.limit.unwrap_or(20).min(50) as i64;
    let offset = ((page - 1) as i64) * limit;

    let disputes = app_state
        .db_client
        .get_open_disputes(limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(PaginatedResponse::new(disputes, page, limit as u32)))
}

pub async fn resolve_dispute(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(dispute_id): Path<Uuid>,
    Json(body): Json<ResolveDisputeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .dispute_service
        .resolve_dispute(dispute_id, &auth.user, body.outcome, body.resolution_note)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success("Dispute resolved", result)))
}
