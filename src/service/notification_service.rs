// service/notification_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::userdb::UserExt,
    mail::mails::{send_dispute_resolved_email, send_funds_released_email},
    models::{escrowmodel::*, marketmodel::*},
    service::error::ServiceError,
    DBClient,
};

#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn notify_offer_received(
        &self,
        client_id: Uuid,
        request: &ServiceRequest,
        offer: &Offer,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            client_id,
            "offer_received",
            Some(request.id),
            Some(serde_json::json!({
                "offer_id": offer.id,
                "price": offer.price,
                "estimated_days": offer.estimated_days,
            })),
            format!("New offer received on: {}", request.title),
        )
        .await
    }

    pub async fn notify_offer_accepted(
        &self,
        professional_id: Uuid,
        request: &ServiceRequest,
        job: &Job,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            professional_id,
            "offer_accepted",
            Some(job.id),
            Some(serde_json::json!({
                "request_title": request.title,
                "agreed_price": job.agreed_price,
            })),
            format!("Your offer was accepted: {}", request.title),
        )
        .await
    }

    pub async fn notify_work_delivered(
        &self,
        client_id: Uuid,
        job: &Job,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            client_id,
            "work_delivered",
            Some(job.id),
            Some(serde_json::json!({ "professional_id": job.professional_id })),
            "Work has been delivered, review and release the funds".to_string(),
        )
        .await
    }

    pub async fn notify_funds_released(
        &self,
        professional_id: Uuid,
        escrow: &EscrowTransaction,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            professional_id,
            "funds_released",
            Some(escrow.job_id),
            Some(serde_json::json!({
                "amount": escrow.amount,
                "escrow_id": escrow.id,
            })),
            "Funds for your job have been released".to_string(),
        )
        .await?;

        // Money-moving events also go out by email, best effort
        if let Ok(Some(user)) = self
            .db_client
            .get_user(Some(professional_id), None, None, None)
            .await
        {
            if let Err(e) = send_funds_released_email(&user.email, &user.username).await {
                tracing::warn!("Failed to send funds-released email: {}", e);
            }
        }

        Ok(())
    }

    pub async fn notify_dispute_opened(
        &self,
        raised_by: Uuid,
        against: Uuid,
        dispute: &Dispute,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            raised_by,
            "dispute_opened",
            Some(dispute.job_id),
            Some(serde_json::json!({ "dispute_id": dispute.id })),
            "Dispute opened, payments are frozen until resolution".to_string(),
        )
        .await?;

        self.store_notification(
            against,
            "dispute_opened_against",
            Some(dispute.job_id),
            Some(serde_json::json!({
                "dispute_id": dispute.id,
                "reason": dispute.reason,
            })),
            format!("A dispute was raised against you: {}", dispute.reason),
        )
        .await
    }

    pub async fn notify_dispute_resolved(
        &self,
        dispute: &Dispute,
        outcome: DisputeOutcome,
    ) -> Result<(), ServiceError> {
        for user_id in [dispute.raised_by, dispute.against] {
            self.store_notification(
                user_id,
                "dispute_resolved",
                Some(dispute.job_id),
                Some(serde_json::json!({
                    "dispute_id": dispute.id,
                    "outcome": outcome.to_str(),
                })),
                format!("Dispute resolved: {}", outcome.to_str()),
            )
            .await?;

            if let Ok(Some(user)) = self
                .db_client
                .get_user(Some(user_id), None, None, None)
                .await
            {
                if let Err(e) =
                    send_dispute_resolved_email(&user.email, &user.username, outcome.to_str())
                        .await
                {
                    tracing::warn!("Failed to send dispute-resolved email: {}", e);
                }
            }
        }

        Ok(())
    }

    async fn store_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        reference_id: Option<Uuid>,
        payload: Option<serde_json::Value>,
        body: String,
    ) -> Result<(), ServiceError> {
        tracing::info!("Notification [{}] for user {}: {}", kind, user_id, body);

        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, reference_id, payload, body)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(reference_id)
        .bind(payload)
        .bind(body)
        .execute(&self.db_client.pool)
        .await?;

        Ok(())
    }

    pub async fn get_user_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, ServiceError> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, reference_id, payload, body, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_client.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn mark_notifications_read(&self, user_id: Uuid) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = true
            WHERE user_id = $1 AND is_read = false
            "#,
        )
        .bind(user_id)
        .execute(&self.db_client.pool)
        .await?;

        Ok(())
    }
}
