use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "service_category", rename_all = "snake_case")]
pub enum ServiceCategory {
    Plumbing,
    Electrical,
    Carpentry,
    Painting,
    Cleaning,
    Gardening,
    Moving,
    ApplianceRepair,
    ItSupport,
    Design,
    Tutoring,
    Other,
}

impl ServiceCategory {
    pub fn to_str(&self) -> &str {
        match self {
            ServiceCategory::Plumbing => "plumbing",
            ServiceCategory::Electrical => "electrical",
            ServiceCategory::Carpentry => "carpentry",
            ServiceCategory::Painting => "painting",
            ServiceCategory::Cleaning => "cleaning",
            ServiceCategory::Gardening => "gardening",
            ServiceCategory::Moving => "moving",
            ServiceCategory::ApplianceRepair => "appliance_repair",
            ServiceCategory::ItSupport => "it_support",
            ServiceCategory::Design => "design",
            ServiceCategory::Tutoring => "tutoring",
            ServiceCategory::Other => "other",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    Matched,
    Closed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "offer_status", rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Delivered,
    Completed,
    Disputed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ProfessionalProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: ServiceCategory,
    pub bio: String,
    pub hourly_rate: Option<BigDecimal>,
    pub location_state: String,
    pub location_city: String,
    pub is_available: Option<bool>,
    pub rating: Option<f32>,
    pub completed_jobs: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub client_id: Uuid,
    pub category: ServiceCategory,
    pub title: String,
    pub description: String,
    pub location_state: String,
    pub location_city: String,
    pub budget: BigDecimal,
    pub status: Option<RequestStatus>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Offer {
    pub id: Uuid,
    pub request_id: Uuid,
    pub professional_id: Uuid,
    pub price: BigDecimal,
    pub message: String,
    pub estimated_days: i32,
    pub status: Option<OfferStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub request_id: Uuid,
    pub offer_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub agreed_price: BigDecimal,
    pub status: Option<JobStatus>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub reference_id: Option<Uuid>,
    pub payload: Option<serde_json::Value>,
    pub body: String,
    pub is_read: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}
