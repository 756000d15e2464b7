// handler/webhooks.rs
//
// Inbound feed from the payment processor. Signature is verified before the
// payload is trusted; events then fold processor truth into the local escrow
// mirror, the same healing the reconciliation job performs on a timer.
use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};

use crate::{
    db::escrowdb::EscrowExt,
    error::HttpError,
    models::escrowmodel::EscrowStatus,
    AppState,
};

pub fn webhooks_handler() -> Router {
    Router::new().route("/payments", post(payment_webhook))
}

pub async fn payment_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, HttpError> {
    let signature = headers
        .get("webhook-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| HttpError::bad_request("Missing webhook signature"))?;

    if !app_state
        .payment_provider
        .verify_webhook_signature(&body, signature)
    {
        tracing::warn!("Rejected payment webhook with invalid signature");
        return Err(HttpError::unauthorized("Invalid webhook signature"));
    }

    let event: serde_json::Value = serde_json::from_str(&body)
        .map_err(|_| HttpError::bad_request("Invalid webhook payload"))?;

    let event_type = event["type"].as_str().unwrap_or("");
    let object = &event["data"]["object"];
    let intent_id = object["id"].as_str().unwrap_or("");

    if intent_id.is_empty() {
        return Ok((StatusCode::OK, Json(serde_json::json!({"received": true}))));
    }

    let escrow = app_state
        .db_client
        .get_escrow_by_payment_intent(intent_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let escrow = match escrow {
        Some(escrow) => escrow,
        None => {
            tracing::warn!("Webhook for unknown payment intent {}", intent_id);
            return Ok((StatusCode::OK, Json(serde_json::json!({"received": true}))));
        }
    };

    let local_status = escrow.status.unwrap_or(EscrowStatus::FundsHeld);

    match event_type {
        "payment_intent.canceled" => {
            if !local_status.is_terminal() {
                tracing::info!(
                    "Webhook: intent {} canceled at processor, settling escrow {} as refunded",
                    intent_id,
                    escrow.id
                );
                app_state
                    .db_client
                    .mark_escrow_settled(escrow.id, EscrowStatus::Refunded)
                    .await
                    .map_err(|e| HttpError::server_error(e.to_string()))?;
            }
        }
        "payment_intent.succeeded" => {
            if !local_status.is_terminal() {
                let amount = object["amount"].as_i64().unwrap_or(0);
                let amount_received = object["amount_received"].as_i64().unwrap_or(0);
                let settled = if amount_received > 0 && amount_received < amount {
                    EscrowStatus::Split
                } else {
                    EscrowStatus::Released
                };
                tracing::info!(
                    "Webhook: intent {} captured at processor, settling escrow {} as {:?}",
                    intent_id,
                    escrow.id,
                    settled
                );
                app_state
                    .db_client
                    .mark_escrow_settled(escrow.id, settled)
                    .await
                    .map_err(|e| HttpError::server_error(e.to_string()))?;
            }
        }
        "payment_intent.amount_capturable_updated" => {
            // Authorization confirmed by the processor; the mirror already
            // reflects funds_held
            tracing::debug!("Webhook: intent {} is capturable", intent_id);
        }
        other => {
            tracing::debug!("Ignoring webhook event type {}", other);
        }
    }

    Ok((StatusCode::OK, Json(serde_json::json!({"received": true}))))
}
