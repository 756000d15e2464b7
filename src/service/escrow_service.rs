// service/escrow_service.rs
use std::sync::Arc;

use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{escrowdb::EscrowExt, marketdb::MarketExt},
    models::{escrowmodel::*, marketmodel::*},
    service::{
        error::ServiceError,
        payment_provider::{generate_reference, PaymentProviderService},
    },
    utils::currency,
    DBClient,
};

/// Legal escrow transitions. Everything the service writes goes through this
/// table; `released`, `refunded` and `split` are terminal.
pub fn is_valid_transition(from: EscrowStatus, to: EscrowStatus) -> bool {
    use EscrowStatus::*;
    match (from, to) {
        (FundsHeld, WorkDelivered) => true,
        (FundsHeld, Refunded) => true,
        (FundsHeld, Disputed) => true,
        (WorkDelivered, Released) => true,
        (WorkDelivered, Refunded) => true,
        (WorkDelivered, Disputed) => true,
        (Disputed, Released) => true,
        (Disputed, Refunded) => true,
        (Disputed, Split) => true,
        _ => false,
    }
}

fn ensure_transition(from: EscrowStatus, to: EscrowStatus) -> Result<(), ServiceError> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(ServiceError::InvalidEscrowTransition(from, to))
    }
}

#[derive(Debug, Clone)]
pub struct FundingResult {
    pub escrow: EscrowTransaction,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct EscrowService {
    db_client: Arc<DBClient>,
    payment_provider: Arc<PaymentProviderService>,
    platform_fee_percent: i64,
}

impl EscrowService {
    pub fn new(
        db_client: Arc<DBClient>,
        payment_provider: Arc<PaymentProviderService>,
        platform_fee_percent: i64,
    ) -> Self {
        Self {
            db_client,
            payment_provider,
            platform_fee_percent,
        }
    }

    /// Fund a job: authorize the agreed price at the processor with manual
    /// capture, then mirror the hold locally as `funds_held`. If the local
    /// insert fails the authorization is cancelled so no orphaned hold
    /// survives.
    pub async fn fund_job(
        &self,
        job_id: Uuid,
        client_id: Uuid,
    ) -> Result<FundingResult, ServiceError> {
        let job = self
            .db_client
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.client_id != client_id {
            return Err(ServiceError::UnauthorizedJobAccess(client_id, job_id));
        }

        if job.status != Some(JobStatus::Active) {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status.unwrap_or(JobStatus::Cancelled)));
        }

        // A job has exactly one escrow transaction
        if self.db_client.get_escrow_by_job_id(job_id).await?.is_some() {
            return Err(ServiceError::Validation(
                "Job is already funded".to_string(),
            ));
        }

        let amount_minor = currency::decimal_to_minor_units(&job.agreed_price);
        if amount_minor <= 0 {
            return Err(ServiceError::Validation(
                "Agreed price must be positive".to_string(),
            ));
        }
        let fee_minor = currency::platform_fee(amount_minor, self.platform_fee_percent);

        let reference = generate_reference();
        let authorization = self
            .payment_provider
            .create_authorization(
                amount_minor,
                "usd",
                &reference,
                Some(serde_json::json!({
                    "job_id": job_id,
                    "client_id": client_id,
                })),
            )
            .await?;

        let fee_bd = BigDecimal::try_from(currency::from_minor_units(fee_minor))
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let inserted = self
            .db_client
            .create_escrow_transaction(
                job_id,
                client_id,
                job.professional_id,
                job.agreed_price.clone(),
                fee_bd,
                &authorization.intent_id,
                &reference,
            )
            .await;

        match inserted {
            Ok(escrow) => Ok(FundingResult {
                escrow,
                client_secret: authorization.client_secret,
            }),
            Err(db_err) => {
                // Compensating action: never leave a hold without a mirror
                if let Err(cancel_err) = self
                    .payment_provider
                    .cancel_payment(&authorization.intent_id)
                    .await
                {
                    tracing::error!(
                        "Failed to cancel authorization {} after escrow insert failure: {}",
                        authorization.intent_id,
                        cancel_err
                    );
                }
                Err(ServiceError::Database(db_err))
            }
        }
    }

    /// Professional marks work delivered: `funds_held` -> `work_delivered`.
    pub async fn mark_delivered(
        &self,
        job_id: Uuid,
        professional_id: Uuid,
    ) -> Result<EscrowTransaction, ServiceError> {
        let escrow = self.escrow_for_job(job_id).await?;

        if escrow.professional_id != professional_id {
            return Err(ServiceError::UnauthorizedJobAccess(professional_id, job_id));
        }

        let current = escrow.status.unwrap_or(EscrowStatus::FundsHeld);
        ensure_transition(current, EscrowStatus::WorkDelivered)?;

        let updated = self
            .db_client
            .transition_escrow_status(escrow.id, current, EscrowStatus::WorkDelivered)
            .await?
            .ok_or(ServiceError::EscrowConflict(job_id))?;

        self.db_client
            .mark_job_delivered(job_id)
            .await?
            .ok_or(ServiceError::EscrowConflict(job_id))?;

        Ok(updated)
    }

    /// Client releases the funds: capture the full authorization, then
    /// `work_delivered` -> `released`.
    pub async fn release_funds(
        &self,
        job_id: Uuid,
        client_id: Uuid,
    ) -> Result<EscrowTransaction, ServiceError> {
        let escrow = self.escrow_for_job(job_id).await?;

        if escrow.client_id != client_id {
            return Err(ServiceError::UnauthorizedJobAccess(client_id, job_id));
        }

        let current = escrow.status.unwrap_or(EscrowStatus::FundsHeld);
        ensure_transition(current, EscrowStatus::Released)?;

        self.payment_provider
            .capture_payment(&escrow.payment_intent_id, None)
            .await?;

        let updated = self
            .db_client
            .transition_escrow_status(escrow.id, current, EscrowStatus::Released)
            .await?
            .ok_or(ServiceError::EscrowConflict(job_id))?;
        let settled = self
            .db_client
            .mark_escrow_settled(updated.id, EscrowStatus::Released)
            .await?;

        self.db_client.mark_job_completed(job_id).await?;

        Ok(settled)
    }

    /// Client refunds before accepting delivery: cancel the authorization,
    /// then transition to `refunded`.
    pub async fn refund(
        &self,
        job_id: Uuid,
        client_id: Uuid,
    ) -> Result<EscrowTransaction, ServiceError> {
        let escrow = self.escrow_for_job(job_id).await?;

        if escrow.client_id != client_id {
            return Err(ServiceError::UnauthorizedJobAccess(client_id, job_id));
        }

        let current = escrow.status.unwrap_or(EscrowStatus::FundsHeld);
        ensure_transition(current, EscrowStatus::Refunded)?;

        self.payment_provider
            .cancel_payment(&escrow.payment_intent_id)
            .await?;

        let updated = self
            .db_client
            .transition_escrow_status(escrow.id, current, EscrowStatus::Refunded)
            .await?
            .ok_or(ServiceError::EscrowConflict(job_id))?;
        let settled = self
            .db_client
            .mark_escrow_settled(updated.id, EscrowStatus::Refunded)
            .await?;

        self.db_client
            .update_job_status(job_id, JobStatus::Cancelled)
            .await?;

        Ok(settled)
    }

    /// Freeze the escrow while a dispute is open.
    pub async fn freeze_for_dispute(
        &self,
        job_id: Uuid,
    ) -> Result<EscrowTransaction, ServiceError> {
        let escrow = self.escrow_for_job(job_id).await?;

        let current = escrow.status.unwrap_or(EscrowStatus::FundsHeld);
        ensure_transition(current, EscrowStatus::Disputed)?;

        self.db_client
            .transition_escrow_status(escrow.id, current, EscrowStatus::Disputed)
            .await?
            .ok_or(ServiceError::EscrowConflict(job_id))
    }

    /// Apply a dispute outcome to a frozen escrow. Money movement happens at
    /// the processor first; the mirror is updated afterwards and the
    /// reconciliation job covers the gap if the second step fails.
    pub async fn settle_dispute(
        &self,
        job_id: Uuid,
        outcome: DisputeOutcome,
    ) -> Result<EscrowTransaction, ServiceError> {
        let escrow = self.escrow_for_job(job_id).await?;

        let current = escrow.status.unwrap_or(EscrowStatus::FundsHeld);
        let target = match outcome {
            DisputeOutcome::Client => EscrowStatus::Refunded,
            DisputeOutcome::Professional => EscrowStatus::Released,
            DisputeOutcome::PartialRefund => EscrowStatus::Split,
        };
        ensure_transition(current, target)?;

        match outcome {
            DisputeOutcome::Client => {
                self.payment_provider
                    .cancel_payment(&escrow.payment_intent_id)
                    .await?;
            }
            DisputeOutcome::Professional => {
                self.payment_provider
                    .capture_payment(&escrow.payment_intent_id, None)
                    .await?;
            }
            DisputeOutcome::PartialRefund => {
                // Capture exactly the professional's half; the processor
                // releases the uncaptured remainder back to the client.
                let total_minor = currency::decimal_to_minor_units(&escrow.amount);
                let (professional_share, client_share) = currency::split_even(total_minor);
                tracing::info!(
                    "Splitting escrow {} for job {}: {} to professional, {} back to client",
                    escrow.id,
                    job_id,
                    professional_share,
                    client_share
                );
                self.payment_provider
                    .capture_payment(&escrow.payment_intent_id, Some(professional_share))
                    .await?;
            }
        }

        let updated = self
            .db_client
            .transition_escrow_status(escrow.id, current, target)
            .await?
            .ok_or(ServiceError::EscrowConflict(job_id))?;

        self.db_client.mark_escrow_settled(updated.id, target).await.map_err(Into::into)
    }

    async fn escrow_for_job(&self, job_id: Uuid) -> Result<EscrowTransaction, ServiceError> {
        self.db_client
            .get_escrow_by_job_id(job_id)
            .await?
            .ok_or(ServiceError::EscrowNotFound(job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::escrowmodel::EscrowStatus::*;

    const ALL: [EscrowStatus; 6] = [FundsHeld, WorkDelivered, Released, Refunded, Split, Disputed];

    #[test]
    fn test_happy_path_transitions() {
        assert!(is_valid_transition(FundsHeld, WorkDelivered));
        assert!(is_valid_transition(WorkDelivered, Released));
        assert!(is_valid_transition(WorkDelivered, Refunded));
        assert!(is_valid_transition(FundsHeld, Refunded));
    }

    #[test]
    fn test_dispute_transitions() {
        assert!(is_valid_transition(FundsHeld, Disputed));
        assert!(is_valid_transition(WorkDelivered, Disputed));
        assert!(is_valid_transition(Disputed, Released));
        assert!(is_valid_transition(Disputed, Refunded));
        assert!(is_valid_transition(Disputed, Split));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for terminal in [Released, Refunded, Split] {
            assert!(terminal.is_terminal());
            for to in ALL {
                assert!(
                    !is_valid_transition(terminal, to),
                    "{:?} -> {:?} must not be allowed",
                    terminal,
                    to
                );
            }
        }
    }

    #[test]
    fn test_no_back_transitions() {
        assert!(!is_valid_transition(WorkDelivered, FundsHeld));
        assert!(!is_valid_transition(Disputed, FundsHeld));
        assert!(!is_valid_transition(Disputed, WorkDelivered));
        assert!(!is_valid_transition(Released, WorkDelivered));
    }

    #[test]
    fn test_split_only_from_dispute() {
        assert!(!is_valid_transition(FundsHeld, Split));
        assert!(!is_valid_transition(WorkDelivered, Split));
        assert!(is_valid_transition(Disputed, Split));
    }

    #[test]
    fn test_self_transitions_rejected() {
        for state in ALL {
            assert!(!is_valid_transition(state, state));
        }
    }
}
