// service/background_jobs.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::{
    db::escrowdb::EscrowExt,
    models::escrowmodel::EscrowStatus,
    AppState,
};

/// Periodically compare every non-terminal escrow against processor truth
/// and fold the processor's state back into the local mirror. The mirror can
/// drift whenever a capture or cancel succeeded at the processor but the
/// follow-up local write failed; this job is the net under that gap.
pub async fn start_escrow_reconciliation_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(900)); // Run every 15 minutes

    loop {
        interval.tick().await;

        tracing::info!("Running escrow reconciliation at {}", Utc::now());

        match reconcile_unsettled_escrows(&app_state).await {
            Ok(checked) => tracing::info!("Escrow reconciliation checked {} rows", checked),
            Err(e) => tracing::error!("Escrow reconciliation failed: {}", e),
        }
    }
}

async fn reconcile_unsettled_escrows(
    app_state: &Arc<AppState>,
) -> Result<usize, crate::service::error::ServiceError> {
    let unsettled = app_state.db_client.get_unsettled_escrows(200).await?;
    let count = unsettled.len();

    // Processor lookups are independent, fetch them concurrently
    let lookups = unsettled.iter().map(|escrow| {
        app_state
            .payment_provider
            .retrieve_payment(&escrow.payment_intent_id)
    });
    let remote_states = futures::future::join_all(lookups).await;

    for (escrow, remote) in unsettled.iter().zip(remote_states) {
        let local_status = escrow.status.unwrap_or(EscrowStatus::FundsHeld);

        let remote = match remote {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    "Could not fetch intent {} for escrow {}: {}",
                    escrow.payment_intent_id,
                    escrow.id,
                    e
                );
                continue;
            }
        };

        let healed_status = match remote.status.as_str() {
            "canceled" => Some(EscrowStatus::Refunded),
            "succeeded" => {
                if remote.amount_received > 0 && remote.amount_received < remote.amount {
                    Some(EscrowStatus::Split)
                } else {
                    Some(EscrowStatus::Released)
                }
            }
            // "requires_capture" and friends match a live local hold
            _ => None,
        };

        if let Some(remote_status) = healed_status {
            tracing::warn!(
                "Escrow {} drifted: local {:?}, processor says {} -> healing to {:?}",
                escrow.id,
                local_status,
                remote.status,
                remote_status
            );

            if let Err(e) = app_state
                .db_client
                .mark_escrow_settled(escrow.id, remote_status)
                .await
            {
                tracing::error!("Failed to heal escrow {}: {}", escrow.id, e);
            }
        }
    }

    Ok(count)
}
