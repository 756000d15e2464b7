use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{escrowmodel::*, marketmodel::*};

// Professional profile DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateProfessionalProfileDto {
    pub category: ServiceCategory,

    #[validate(length(min = 10, max = 1000, message = "Bio must be between 10 and 1000 characters"))]
    pub bio: String,

    #[validate(range(min = 0.0, message = "Hourly rate must be positive"))]
    pub hourly_rate: Option<f64>,

    #[validate(length(min = 1, message = "State is required"))]
    pub location_state: String,

    #[validate(length(min = 1, message = "City is required"))]
    pub location_city: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateProfessionalProfileDto {
    pub category: Option<ServiceCategory>,

    #[validate(length(min = 10, max = 1000, message = "Bio must be between 10 and 1000 characters"))]
    pub bio: Option<String>,

    #[validate(range(min = 0.0, message = "Hourly rate must be positive"))]
    pub hourly_rate: Option<f64>,

    #[validate(length(min = 1, message = "State cannot be empty"))]
    pub location_state: Option<String>,

    #[validate(length(min = 1, message = "City cannot be empty"))]
    pub location_city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAvailabilityDto {
    pub is_available: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SearchProfessionalsDto {
    pub category: Option<ServiceCategory>,
    pub location_state: Option<String>,
    pub location_city: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// Service request DTOs
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateServiceRequestDto {
    pub category: ServiceCategory,

    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(min = 20, max = 2000, message = "Description must be between 20 and 2000 characters"))]
    pub description: String,

    #[validate(length(min = 1, message = "State is required"))]
    pub location_state: String,

    #[validate(length(min = 1, message = "City is required"))]
    pub location_city: String,

    #[validate(range(min = 1.0, message = "Budget must be positive"))]
    pub budget: f64,

    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SearchRequestsDto {
    pub category: Option<ServiceCategory>,
    pub location_state: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// Offer DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOfferDto {
    #[validate(range(min = 1.0, message = "Price must be positive"))]
    pub price: f64,

    #[validate(length(min = 10, max = 2000, message = "Message must be between 10 and 2000 characters"))]
    pub message: String,

    #[validate(range(min = 1, max = 365, message = "Estimated days must be between 1 and 365"))]
    pub estimated_days: i32,
}

// Escrow DTOs
#[derive(Debug, Serialize)]
pub struct FundJobResponseDto {
    pub escrow: EscrowTransaction,
    /// Handed to the embedded checkout on the client side
    pub client_secret: String,
}

// Dispute DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateDisputeDto {
    #[validate(length(min = 1, max = 100, message = "Reason is required"))]
    pub reason: String,

    #[validate(length(min = 20, max = 2000, message = "Description must be between 20 and 2000 characters"))]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResolveDisputeDto {
    pub outcome: DisputeOutcome,

    #[validate(length(min = 20, max = 1000, message = "Resolution note must be between 20 and 1000 characters"))]
    pub resolution_note: String,
}

#[derive(Debug, Serialize)]
pub struct JobDetailsDto {
    pub job: Job,
    pub escrow: Option<EscrowTransaction>,
    pub dispute: Option<Dispute>,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// Response wrappers
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub status: String,
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, limit: u32) -> Self {
        Self {
            status: "success".to_string(),
            data,
            page,
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_offer_validation() {
        let valid = CreateOfferDto {
            price: 150.0,
            message: "I can take care of this next week.".to_string(),
            estimated_days: 5,
        };
        assert!(valid.validate().is_ok());

        let bad_price = CreateOfferDto {
            price: 0.0,
            ..valid
        };
        assert!(bad_price.validate().is_err());
    }

    #[test]
    fn test_create_request_requires_description() {
        let dto = CreateServiceRequestDto {
            category: ServiceCategory::Plumbing,
            title: "Fix kitchen sink".to_string(),
            description: "too short".to_string(),
            location_state: "Madrid".to_string(),
            location_city: "Madrid".to_string(),
            budget: 120.0,
            deadline: None,
        };
        assert!(dto.validate().is_err());
    }
}
