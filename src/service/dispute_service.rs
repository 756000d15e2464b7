// service/dispute_service.rs
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{escrowdb::EscrowExt, marketdb::MarketExt},
    models::{escrowmodel::*, marketmodel::*, usermodel::{User, UserRole}},
    service::{
        error::ServiceError, escrow_service::EscrowService,
        notification_service::NotificationService,
    },
    DBClient,
};

#[derive(Debug, Serialize)]
pub struct DisputeCreationResult {
    pub dispute: Dispute,
    pub job: Job,
    pub escrow: EscrowTransaction,
}

#[derive(Debug, Serialize)]
pub struct DisputeResolutionResult {
    pub dispute: Dispute,
    pub job: Job,
    pub escrow: EscrowTransaction,
}

#[derive(Debug, Clone)]
pub struct DisputeService {
    db_client: Arc<DBClient>,
    escrow_service: Arc<EscrowService>,
    notification_service: Arc<NotificationService>,
}

impl DisputeService {
    pub fn new(
        db_client: Arc<DBClient>,
        escrow_service: Arc<EscrowService>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            escrow_service,
            notification_service,
        }
    }

    /// Either party to a funded job can open a dispute; the job and its
    /// escrow freeze until an admin resolves it.
    pub async fn create_dispute(
        &self,
        job_id: Uuid,
        raised_by: Uuid,
        reason: String,
        description: String,
    ) -> Result<DisputeCreationResult, ServiceError> {
        let job = self
            .db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        let against = if job.client_id == raised_by {
            job.professional_id
        } else if job.professional_id == raised_by {
            job.client_id
        } else {
            return Err(ServiceError::UnauthorizedJobAccess(raised_by, job_id));
        };

        if self
            .db_client
            .get_open_dispute_for_job(job_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Validation(
                "Job already has an open dispute".to_string(),
            ));
        }

        // Freeze the money first; a job that cannot freeze cannot be disputed
        let frozen_escrow = self.escrow_service.freeze_for_dispute(job_id).await?;

        let dispute = self
            .db_client
            .create_dispute(job_id, raised_by, against, reason, description)
            .await?;

        let disputed_job = self
            .db_client
            .update_job_status(job_id, JobStatus::Disputed)
            .await?;

        self.notification_service
            .notify_dispute_opened(raised_by, against, &dispute)
            .await?;

        Ok(DisputeCreationResult {
            dispute,
            job: disputed_job,
            escrow: frozen_escrow,
        })
    }

    /// Resolve an open dispute to one of the three fixed outcomes. Gated on
    /// the admin role before anything is touched.
    pub async fn resolve_dispute(
        &self,
        dispute_id: Uuid,
        resolver: &User,
        outcome: DisputeOutcome,
        resolution_note: String,
    ) -> Result<DisputeResolutionResult, ServiceError> {
        if resolver.role != UserRole::Admin {
            return Err(ServiceError::AdminRequired);
        }

        let dispute = self
            .db_client
            .get_dispute_by_id(dispute_id)
            .await?
            .ok_or(ServiceError::DisputeNotFound(dispute_id))?;

        if dispute.status == Some(DisputeStatus::Resolved) {
            return Err(ServiceError::DisputeAlreadyResolved(dispute_id));
        }

        // Move the money and the escrow mirror
        let settled_escrow = self
            .escrow_service
            .settle_dispute(dispute.job_id, outcome)
            .await?;

        let resolved_dispute = self
            .db_client
            .resolve_dispute(dispute_id, resolver.id, outcome, resolution_note)
            .await?
            .ok_or(ServiceError::DisputeAlreadyResolved(dispute_id))?;

        let job_status = match outcome {
            DisputeOutcome::Client => JobStatus::Cancelled,
            DisputeOutcome::Professional | DisputeOutcome::PartialRefund => JobStatus::Completed,
        };
        let updated_job = self
            .db_client
            .update_job_status(dispute.job_id, job_status)
            .await?;

        self.notification_service
            .notify_dispute_resolved(&resolved_dispute, outcome)
            .await?;

        tracing::info!(
            "Dispute {} resolved as {} by admin {}",
            dispute_id,
            outcome.to_str(),
            resolver.id
        );

        Ok(DisputeResolutionResult {
            dispute: resolved_dispute,
            job: updated_job,
            escrow: settled_escrow,
        })
    }
}
