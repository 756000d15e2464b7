use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "escrow_status", rename_all = "snake_case")]
pub enum EscrowStatus {
    FundsHeld,
    WorkDelivered,
    Released,
    Refunded,
    Split,
    Disputed,
}

impl EscrowStatus {
    pub fn to_str(&self) -> &str {
        match self {
            EscrowStatus::FundsHeld => "funds_held",
            EscrowStatus::WorkDelivered => "work_delivered",
            EscrowStatus::Released => "released",
            EscrowStatus::Refunded => "refunded",
            EscrowStatus::Split => "split",
            EscrowStatus::Disputed => "disputed",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EscrowStatus::Released | EscrowStatus::Refunded | EscrowStatus::Split
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "dispute_status", rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    Resolved,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "dispute_outcome", rename_all = "snake_case")]
pub enum DisputeOutcome {
    Client,
    Professional,
    PartialRefund,
}

impl DisputeOutcome {
    pub fn to_str(&self) -> &str {
        match self {
            DisputeOutcome::Client => "client",
            DisputeOutcome::Professional => "professional",
            DisputeOutcome::PartialRefund => "partial_refund",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct EscrowTransaction {
    pub id: Uuid,
    pub job_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub amount: BigDecimal,
    pub platform_fee: BigDecimal,
    pub status: Option<EscrowStatus>,
    pub payment_intent_id: String,
    pub payment_reference: String,
    pub created_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Dispute {
    pub id: Uuid,
    pub job_id: Uuid,
    pub raised_by: Uuid,
    pub against: Uuid,
    pub reason: String,
    pub description: String,
    pub status: Option<DisputeStatus>,
    pub outcome: Option<DisputeOutcome>,
    pub resolved_by: Option<Uuid>,
    pub resolution_note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}
