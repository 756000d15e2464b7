// service/payment_provider.rs
//
// Client for the hosted payment processor's "authorize now, capture later"
// primitive: a payment intent is created with manual capture, then either
// captured (fully or partially) or cancelled. Every mutating call carries a
// deterministic idempotency key so a retried request cannot double-capture
// or double-cancel.
use hmac::{Hmac, Mac};
use rand::distr::Alphanumeric;
use rand::Rng;
use reqwest;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{config::Config, service::error::ServiceError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaymentAuthorization {
    pub intent_id: String,
    pub client_secret: String,
    pub status: String,
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureResult {
    pub intent_id: String,
    pub status: String,
    pub amount_captured: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentIntentState {
    pub intent_id: String,
    pub status: String,
    pub amount: i64,
    pub amount_received: i64,
}

#[derive(Debug, Clone)]
pub struct PaymentProviderService {
    secret_key: String,
    webhook_secret: String,
    api_base: String,
    client: reqwest::Client,
}

impl PaymentProviderService {
    pub fn new(config: &Config) -> Self {
        Self {
            secret_key: config.payment_secret_key.clone(),
            webhook_secret: config.payment_webhook_secret.clone(),
            api_base: config.payment_api_base.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Create an authorization with manual capture. Funds are held on the
    /// client's card but not moved until an explicit capture.
    pub async fn create_authorization(
        &self,
        amount_minor: i64,
        currency: &str,
        reference: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<PaymentAuthorization, ServiceError> {
        let payload = serde_json::json!({
            "amount": amount_minor,
            "currency": currency,
            "capture_method": "manual",
            "reference": reference,
            "metadata": metadata.unwrap_or(serde_json::json!({})),
        });

        let response = self
            .client
            .post(format!("{}/payment_intents", self.api_base))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Idempotency-Key", format!("authorize-{}", reference))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::PaymentProvider(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::PaymentProvider(e.to_string()))?;

        if let Some(error) = body.get("error") {
            return Err(ServiceError::PaymentProvider(
                error["message"]
                    .as_str()
                    .unwrap_or("Payment authorization failed")
                    .to_string(),
            ));
        }

        Ok(PaymentAuthorization {
            intent_id: body["id"].as_str().unwrap_or("").to_string(),
            client_secret: body["client_secret"].as_str().unwrap_or("").to_string(),
            status: body["status"].as_str().unwrap_or("").to_string(),
            amount: body["amount"].as_i64().unwrap_or(amount_minor),
        })
    }

    /// Capture a held authorization. `amount_to_capture` below the authorized
    /// amount performs a partial capture; the processor releases the
    /// remainder back to the client.
    pub async fn capture_payment(
        &self,
        intent_id: &str,
        amount_to_capture: Option<i64>,
    ) -> Result<CaptureResult, ServiceError> {
        let mut payload = serde_json::json!({});
        if let Some(amount) = amount_to_capture {
            payload["amount_to_capture"] = serde_json::json!(amount);
        }

        let response = self
            .client
            .post(format!(
                "{}/payment_intents/{}/capture",
                self.api_base, intent_id
            ))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Idempotency-Key", format!("capture-{}", intent_id))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::PaymentProvider(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::PaymentProvider(e.to_string()))?;

        if let Some(error) = body.get("error") {
            return Err(ServiceError::PaymentProvider(
                error["message"]
                    .as_str()
                    .unwrap_or("Payment capture failed")
                    .to_string(),
            ));
        }

        Ok(CaptureResult {
            intent_id: body["id"].as_str().unwrap_or(intent_id).to_string(),
            status: body["status"].as_str().unwrap_or("").to_string(),
            amount_captured: body["amount_received"].as_i64().unwrap_or(0),
        })
    }

    /// Cancel a held authorization, releasing the full amount back to the
    /// client.
    pub async fn cancel_payment(&self, intent_id: &str) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(format!(
                "{}/payment_intents/{}/cancel",
                self.api_base, intent_id
            ))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Idempotency-Key", format!("cancel-{}", intent_id))
            .send()
            .await
            .map_err(|e| ServiceError::PaymentProvider(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::PaymentProvider(e.to_string()))?;

        if let Some(error) = body.get("error") {
            return Err(ServiceError::PaymentProvider(
                error["message"]
                    .as_str()
                    .unwrap_or("Payment cancellation failed")
                    .to_string(),
            ));
        }

        Ok(body["status"].as_str().unwrap_or("canceled").to_string())
    }

    /// Fetch processor-side truth for an intent, used by reconciliation.
    pub async fn retrieve_payment(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntentState, ServiceError> {
        let response = self
            .client
            .get(format!("{}/payment_intents/{}", self.api_base, intent_id))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .send()
            .await
            .map_err(|e| ServiceError::PaymentProvider(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::PaymentProvider(e.to_string()))?;

        if let Some(error) = body.get("error") {
            return Err(ServiceError::PaymentProvider(
                error["message"]
                    .as_str()
                    .unwrap_or("Payment retrieval failed")
                    .to_string(),
            ));
        }

        Ok(PaymentIntentState {
            intent_id: body["id"].as_str().unwrap_or(intent_id).to_string(),
            status: body["status"].as_str().unwrap_or("").to_string(),
            amount: body["amount"].as_i64().unwrap_or(0),
            amount_received: body["amount_received"].as_i64().unwrap_or(0),
        })
    }

    /// Verify the signature header of a webhook delivery. The header carries
    /// a timestamp and an HMAC-SHA256 over `"{timestamp}.{payload}"`;
    /// comparison is constant-time.
    pub fn verify_webhook_signature(&self, payload: &str, signature_header: &str) -> bool {
        verify_signature(&self.webhook_secret, payload, signature_header)
    }
}

pub fn verify_signature(secret: &str, payload: &str, signature_header: &str) -> bool {
    let mut timestamp: Option<&str> = None;
    let mut signature: Option<&str> = None;

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }

    let (timestamp, signature) = match (timestamp, signature) {
        (Some(t), Some(s)) => (t, s),
        _ => return false,
    };

    let expected = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    let computed = mac.finalize().into_bytes();

    computed.as_slice().ct_eq(expected.as_slice()).into()
}

/// Unique reference attached to each authorization; also seeds the
/// idempotency key for intent creation.
pub fn generate_reference() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..12).map(|_| rng.sample(Alphanumeric) as char).collect();
    format!("wl_{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: &str, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = r#"{"type":"payment_intent.succeeded"}"#;
        let sig = sign("whsec_test", "1700000000", payload);
        let header = format!("t=1700000000,v1={}", sig);

        assert!(verify_signature("whsec_test", payload, &header));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let sig = sign("whsec_test", "1700000000", r#"{"amount":100}"#);
        let header = format!("t=1700000000,v1={}", sig);

        assert!(!verify_signature("whsec_test", r#"{"amount":999}"#, &header));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = r#"{"type":"payment_intent.canceled"}"#;
        let sig = sign("whsec_other", "1700000000", payload);
        let header = format!("t=1700000000,v1={}", sig);

        assert!(!verify_signature("whsec_test", payload, &header));
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(!verify_signature("whsec_test", "{}", "garbage"));
        assert!(!verify_signature("whsec_test", "{}", "t=123"));
        assert!(!verify_signature("whsec_test", "{}", "t=123,v1=nothex"));
    }

    #[test]
    fn test_generate_reference_shape() {
        let reference = generate_reference();
        assert!(reference.starts_with("wl_"));
        assert_eq!(reference.len(), 15);

        // Two references should practically never collide
        assert_ne!(generate_reference(), generate_reference());
    }
}
