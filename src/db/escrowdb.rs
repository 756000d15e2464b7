// db/escrowdb.rs
use async_trait::async_trait;
use sqlx::{types::BigDecimal, Error};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::escrowmodel::*;

#[async_trait]
pub trait EscrowExt {
    async fn create_escrow_transaction(
        &self,
        job_id: Uuid,
        client_id: Uuid,
        professional_id: Uuid,
        amount: BigDecimal,
        platform_fee: BigDecimal,
        payment_intent_id: &str,
        payment_reference: &str,
    ) -> Result<EscrowTransaction, Error>;

    async fn get_escrow_by_id(&self, escrow_id: Uuid)
        -> Result<Option<EscrowTransaction>, Error>;

    async fn get_escrow_by_job_id(
        &self,
        job_id: Uuid,
    ) -> Result<Option<EscrowTransaction>, Error>;

    async fn get_escrow_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<EscrowTransaction>, Error>;

    /// Compare-and-swap status update. Returns None when the row was not in
    /// the expected state, so double-release and racing resolutions surface
    /// as clean conflicts instead of silent overwrites.
    async fn transition_escrow_status(
        &self,
        escrow_id: Uuid,
        expected: EscrowStatus,
        next: EscrowStatus,
    ) -> Result<Option<EscrowTransaction>, Error>;

    async fn mark_escrow_settled(
        &self,
        escrow_id: Uuid,
        status: EscrowStatus,
    ) -> Result<EscrowTransaction, Error>;

    /// Escrows still mirroring a live processor authorization, for the
    /// reconciliation job.
    async fn get_unsettled_escrows(&self, limit: i64)
        -> Result<Vec<EscrowTransaction>, Error>;

    // Disputes
    async fn create_dispute(
        &self,
        job_id: Uuid,
        raised_by: Uuid,
        against: Uuid,
        reason: String,
        description: String,
    ) -> Result<Dispute, Error>;

    async fn get_dispute_by_id(&self, dispute_id: Uuid) -> Result<Option<Dispute>, Error>;

    async fn get_open_dispute_for_job(&self, job_id: Uuid) -> Result<Option<Dispute>, Error>;

    async fn get_open_disputes(&self, limit: i64, offset: i64) -> Result<Vec<Dispute>, Error>;

    async fn resolve_dispute(
        &self,
        dispute_id: Uuid,
        resolved_by: Uuid,
        outcome: DisputeOutcome,
        resolution_note: String,
    ) -> Result<Option<Dispute>, Error>;
}

#[async_trait]
impl EscrowExt for DBClient {
    async fn create_escrow_transaction(
        &self,
        job_id: Uuid,
        client_id: Uuid,
        professional_id: Uuid,
        amount: BigDecimal,
        platform_fee: BigDecimal,
        payment_intent_id: &str,
        payment_reference: &str,
    ) -> Result<EscrowTransaction, Error> {
        sqlx::query_as::<_, EscrowTransaction>(
            r#"
            INSERT INTO escrow_transactions
            (job_id, client_id, professional_id, amount, platform_fee,
             payment_intent_id, payment_reference)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, job_id, client_id, professional_id, amount,
                      platform_fee, status, payment_intent_id,
                      payment_reference, created_at, released_at
            "#,
        )
        .bind(job_id)
        .bind(client_id)
        .bind(professional_id)
        .bind(amount)
        .bind(platform_fee)
        .bind(payment_intent_id)
        .bind(payment_reference)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_escrow_by_id(
        &self,
        escrow_id: Uuid,
    ) -> Result<Option<EscrowTransaction>, Error> {
        sqlx::query_as::<_, EscrowTransaction>(
            r#"
            SELECT id, job_id, client_id, professional_id, amount,
                   platform_fee, status, payment_intent_id,
                   payment_reference, created_at, released_at
            FROM escrow_transactions
            WHERE id = $1
            "#,
        )
        .bind(escrow_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_escrow_by_job_id(
        &self,
        job_id: Uuid,
    ) -> Result<Option<EscrowTransaction>, Error> {
        sqlx::query_as::<_, EscrowTransaction>(
            r#"
            SELECT id, job_id, client_id, professional_id, amount,
                   platform_fee, status, payment_intent_id,
                   payment_reference, created_at, released_at
            FROM escrow_transactions
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_escrow_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<EscrowTransaction>, Error> {
        sqlx::query_as::<_, EscrowTransaction>(
            r#"
            SELECT id, job_id, client_id, professional_id, amount,
                   platform_fee, status, payment_intent_id,
                   payment_reference, created_at, released_at
            FROM escrow_transactions
            WHERE payment_intent_id = $1
            "#,
        )
        .bind(payment_intent_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn transition_escrow_status(
        &self,
        escrow_id: Uuid,
        expected: EscrowStatus,
        next: EscrowStatus,
    ) -> Result<Option<EscrowTransaction>, Error> {
        sqlx::query_as::<_, EscrowTransaction>(
            r#"
            UPDATE escrow_transactions
            SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING id, job_id, client_id, professional_id, amount,
                      platform_fee, status, payment_intent_id,
                      payment_reference, created_at, released_at
            "#,
        )
        .bind(escrow_id)
        .bind(expected)
        .bind(next)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_escrow_settled(
        &self,
        escrow_id: Uuid,
        status: EscrowStatus,
    ) -> Result<EscrowTransaction, Error> {
        sqlx::query_as::<_, EscrowTransaction>(
            r#"
            UPDATE escrow_transactions
            SET status = $2, released_at = NOW()
            WHERE id = $1
            RETURNING id, job_id, client_id, professional_id, amount,
                      platform_fee, status, payment_intent_id,
                      payment_reference, created_at, released_at
            "#,
        )
        .bind(escrow_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_unsettled_escrows(
        &self,
        limit: i64,
    ) -> Result<Vec<EscrowTransaction>, Error> {
        sqlx::query_as::<_, EscrowTransaction>(
            r#"
            SELECT id, job_id, client_id, professional_id, amount,
                   platform_fee, status, payment_intent_id,
                   payment_reference, created_at, released_at
            FROM escrow_transactions
            WHERE status IN ('funds_held'::escrow_status,
                             'work_delivered'::escrow_status,
                             'disputed'::escrow_status)
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_dispute(
        &self,
        job_id: Uuid,
        raised_by: Uuid,
        against: Uuid,
        reason: String,
        description: String,
    ) -> Result<Dispute, Error> {
        sqlx::query_as::<_, Dispute>(
            r#"
            INSERT INTO disputes (job_id, raised_by, against, reason, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, job_id, raised_by, against, reason, description,
                      status, outcome, resolved_by, resolution_note,
                      created_at, resolved_at
            "#,
        )
        .bind(job_id)
        .bind(raised_by)
        .bind(against)
        .bind(reason)
        .bind(description)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_dispute_by_id(&self, dispute_id: Uuid) -> Result<Option<Dispute>, Error> {
        sqlx::query_as::<_, Dispute>(
            r#"
            SELECT id, job_id, raised_by, against, reason, description,
                   status, outcome, resolved_by, resolution_note,
                   created_at, resolved_at
            FROM disputes
            WHERE id = $1
            "#,
        )
        .bind(dispute_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_open_dispute_for_job(&self, job_id: Uuid) -> Result<Option<Dispute>, Error> {
        sqlx::query_as::<_, Dispute>(
            r#"
            SELECT id, job_id, raised_by, against, reason, description,
                   status, outcome, resolved_by, resolution_note,
                   created_at, resolved_at
            FROM disputes
            WHERE job_id = $1 AND status = 'open'::dispute_status
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_open_disputes(&self, limit: i64, offset: i64) -> Result<Vec<Dispute>, Error> {
        sqlx::query_as::<_, Dispute>(
            r#"
            SELECT id, job_id, raised_by, against, reason, description,
                   status, outcome, resolved_by, resolution_note,
                   created_at, resolved_at
            FROM disputes
            WHERE status = 'open'::dispute_status
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn resolve_dispute(
        &self,
        dispute_id: Uuid,
        resolved_by: Uuid,
        outcome: DisputeOutcome,
        resolution_note: String,
    ) -> Result<Option<Dispute>, Error> {
        // Guarded on the open status so racing resolutions cannot both win
        sqlx::query_as::<_, Dispute>(
            r#"
            UPDATE disputes
            SET status = 'resolved'::dispute_status,
                outcome = $3,
                resolved_by = $2,
                resolution_note = $4,
                resolved_at = NOW()
            WHERE id = $1 AND status = 'open'::dispute_status
            RETURNING id, job_id, raised_by, against, reason, description,
                      status, outcome, resolved_by, resolution_note,
                      created_at, resolved_at
            "#,
        )
        .bind(dispute_id)
        .bind(resolved_by)
        .bind(outcome)
        .bind(resolution_note)
        .fetch_optional(&self.pool)
        .await
    }
}
