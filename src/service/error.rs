use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::HttpError,
    models::{escrowmodel::EscrowStatus, marketmodel::JobStatus},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Professional profile not found for user {0}")]
    ProfessionalProfileNotFound(Uuid),

    #[error("Service request {0} not found")]
    RequestNotFound(Uuid),

    #[error("Offer {0} not found")]
    OfferNotFound(Uuid),

    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Job {0} is not in status {1:?}")]
    InvalidJobStatus(Uuid, JobStatus),

    #[error("User {0} is not authorized to perform this action on job {1}")]
    UnauthorizedJobAccess(Uuid, Uuid),

    #[error("Only an admin can perform this action")]
    AdminRequired,

    #[error("Invalid escrow state transition from {0:?} to {1:?}")]
    InvalidEscrowTransition(EscrowStatus, EscrowStatus),

    #[error("Escrow for job {0} was modified concurrently")]
    EscrowConflict(Uuid),

    #[error("Escrow not found for job {0}")]
    EscrowNotFound(Uuid),

    #[error("Dispute {0} not found")]
    DisputeNotFound(Uuid),

    #[error("Dispute {0} is already resolved")]
    DisputeAlreadyResolved(Uuid),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ProfessionalProfileNotFound(_)
            | ServiceError::RequestNotFound(_)
            | ServiceError::OfferNotFound(_)
            | ServiceError::JobNotFound(_)
            | ServiceError::EscrowNotFound(_)
            | ServiceError::DisputeNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidJobStatus(_, _)
            | ServiceError::InvalidEscrowTransition(_, _)
            | ServiceError::DisputeAlreadyResolved(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::EscrowConflict(_) => StatusCode::CONFLICT,

            ServiceError::UnauthorizedJobAccess(_, _) => StatusCode::UNAUTHORIZED,

            ServiceError::AdminRequired => StatusCode::FORBIDDEN,

            ServiceError::PaymentProvider(_) => StatusCode::PAYMENT_REQUIRED,

            ServiceError::Database(_) | ServiceError::Notification(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        HttpError::new(error.to_string(), error.status_code())
    }
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Validation(err)
    }
}
