use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{
    config::PaymongoConfig,
    error::{AppError, Result},
    payments::{CheckoutSession, CheckoutSessionRequest, PaymentGateway, WebhookEvent},
};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "paymongo-signature";

/// PayMongo checkout-session client. Authenticates with HTTP basic auth,
/// secret key as the user name.
#[derive(Debug, Clone)]
pub struct PaymongoClient {
    client: Client,
    secret_key: Option<String>,
    api_base: String,
}

impl PaymongoClient {
    pub fn new(config: &PaymongoConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        if config.secret_key.is_none() {
            tracing::warn!("PayMongo secret key not configured, checkout will be unavailable");
        }

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct LineItem<'a> {
    currency: &'a str,
    amount: i64,
    name: &'a str,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    data: CheckoutSessionData,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionData {
    id: String,
    attributes: CheckoutSessionAttributes,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionAttributes {
    checkout_url: String,
    payment_intent: Option<PaymentIntentRef>,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentRef {
    id: String,
}

fn checkout_body(request: &CheckoutSessionRequest) -> serde_json::Value {
    let line_items = [LineItem {
        currency: &request.currency,
        amount: request.amount_cents,
        name: &request.item_name,
        quantity: 1,
    }];

    json!({
        "data": {
            "attributes": {
                "line_items": line_items,
                "payment_method_types": [request.method.as_str()],
                "success_url": request.success_url,
                "cancel_url": request.cancel_url,
                "description": request.description,
                "send_email_receipt": false,
                "show_description": true,
                "show_line_items": true,
                "metadata": {
                    "appointmentId": request.appointment_id.to_string(),
                    "userId": request.user_id.to_string(),
                },
            }
        }
    })
}

#[async_trait]
impl PaymentGateway for PaymongoClient {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> Result<CheckoutSession> {
        let secret_key = self.secret_key.as_deref().ok_or_else(|| {
            AppError::Internal("Online payments are not configured".to_string())
        })?;

        let response = self
            .client
            .post(format!("{}/checkout_sessions", self.api_base))
            .basic_auth(secret_key, None::<&str>)
            .json(&checkout_body(&request))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("PayMongo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let session: CheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse PayMongo response: {}", e)))?;

        let payment_intent_id = session
            .data
            .attributes
            .payment_intent
            .map(|intent| intent.id)
            .ok_or_else(|| AppError::Internal("PayMongo returned no payment intent".to_string()))?;

        tracing::debug!(
            "Opened checkout session {} for appointment {}",
            session.data.id,
            request.appointment_id
        );

        Ok(CheckoutSession {
            session_id: session.data.id,
            checkout_url: session.data.attributes.checkout_url,
            payment_intent_id,
        })
    }
}

/// Check a `Paymongo-Signature` header (`t=<ts>,te=<sig>,li=<sig>`) against
/// the raw body. The signature is HMAC-SHA256 over `"{t}.{body}"`, hex encoded;
/// either the test-mode or the live-mode value may carry it.
pub fn verify_webhook_signature(secret: &str, payload: &[u8], header: &str) -> Result<bool> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = Some(t);
        } else if let Some(s) = part.strip_prefix("te=").or_else(|| part.strip_prefix("li=")) {
            if !s.is_empty() {
                signatures.push(s);
            }
        }
    }

    let timestamp = match timestamp {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(false),
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Invalid webhook secret".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());
    let expected = expected.as_bytes();

    Ok(signatures
        .iter()
        .any(|s| s.len() == expected.len() && bool::from(expected.ct_eq(s.as_bytes()))))
}

#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    data: EventResource,
}

#[derive(Debug, Deserialize)]
struct EventResource {
    attributes: EventAttributes,
}

#[derive(Debug, Deserialize)]
struct EventAttributes {
    #[serde(rename = "type")]
    event_type: String,
    data: Option<PaymentResource>,
}

#[derive(Debug, Deserialize)]
struct PaymentResource {
    id: String,
    attributes: PaymentAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentAttributes {
    payment_intent_id: Option<String>,
    metadata: Option<PaymentMetadata>,
    paid_at: Option<i64>,
    failed_message: Option<String>,
    failed_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentMetadata {
    #[serde(rename = "appointmentId")]
    appointment_id: Option<String>,
}

/// Decode a webhook body into the event the booking flow handles.
pub fn parse_webhook_event(payload: &[u8]) -> Result<WebhookEvent> {
    let envelope: WebhookEnvelope = serde_json::from_slice(payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    let attributes = envelope.data.attributes;
    let event_type = attributes.event_type;

    if event_type != "payment.paid" && event_type != "payment.failed" {
        return Ok(WebhookEvent::Ignored { event_type });
    }

    let payment = attributes.data.ok_or_else(|| {
        AppError::BadRequest(format!("{} event carries no payment", event_type))
    })?;
    let payment_intent_id = payment.attributes.payment_intent_id.clone().ok_or_else(|| {
        AppError::BadRequest(format!("{} event carries no payment intent id", event_type))
    })?;

    if event_type == "payment.paid" {
        Ok(WebhookEvent::Paid {
            payment_intent_id,
            external_payment_id: payment.id,
            paid_at: payment
                .attributes
                .paid_at
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            appointment_id: payment.attributes.metadata.and_then(|m| m.appointment_id),
        })
    } else {
        Ok(WebhookEvent::Failed {
            payment_intent_id,
            failed_code: payment.attributes.failed_code,
            failed_message: payment.attributes.failed_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    use crate::domain::PaymentMethod;

    fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.", timestamp).as_bytes());
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_test_mode_signature() {
        let body = br#"{"data":{}}"#;
        let sig = sign("whsk_test", "1700000000", body);
        let header = format!("t=1700000000,te={},li=", sig);
        assert!(verify_webhook_signature("whsk_test", body, &header).unwrap());
    }

    #[test]
    fn test_valid_live_mode_signature() {
        let body = br#"{"data":{}}"#;
        let sig = sign("whsk_live", "1700000000", body);
        let header = format!("t=1700000000,te=,li={}", sig);
        assert!(verify_webhook_signature("whsk_live", body, &header).unwrap());
    }

    #[test]
    fn test_rejects_tampered_body_and_wrong_secret() {
        let body = br#"{"amount":100}"#;
        let sig = sign("whsk_test", "1700000000", body);
        let header = format!("t=1700000000,te={}", sig);

        assert!(!verify_webhook_signature("whsk_test", br#"{"amount":999}"#, &header).unwrap());
        assert!(!verify_webhook_signature("other", body, &header).unwrap());
    }

    #[test]
    fn test_rejects_malformed_headers() {
        let body = b"{}";
        assert!(!verify_webhook_signature("s", body, "").unwrap());
        assert!(!verify_webhook_signature("s", body, "te=abc").unwrap());
        assert!(!verify_webhook_signature("s", body, "t=1,te=,li=").unwrap());
        assert!(!verify_webhook_signature("s", body, "t=1,te=short").unwrap());
    }

    #[test]
    fn test_parse_paid_event() {
        let body = json!({
            "data": {
                "id": "evt_1",
                "attributes": {
                    "type": "payment.paid",
                    "data": {
                        "id": "pay_123",
                        "attributes": {
                            "payment_intent_id": "pi_123",
                            "paid_at": 1_700_000_000,
                            "metadata": { "appointmentId": "abc" }
                        }
                    }
                }
            }
        });

        let event = parse_webhook_event(body.to_string().as_bytes()).unwrap();
        assert_eq!(
            event,
            WebhookEvent::Paid {
                payment_intent_id: "pi_123".to_string(),
                external_payment_id: "pay_123".to_string(),
                paid_at: Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap()),
                appointment_id: Some("abc".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_failed_event_without_details() {
        let body = json!({
            "data": {
                "attributes": {
                    "type": "payment.failed",
                    "data": {
                        "id": "pay_9",
                        "attributes": { "payment_intent_id": "pi_9" }
                    }
                }
            }
        });

        let event = parse_webhook_event(body.to_string().as_bytes()).unwrap();
        assert_eq!(
            event,
            WebhookEvent::Failed {
                payment_intent_id: "pi_9".to_string(),
                failed_code: None,
                failed_message: None,
            }
        );
    }

    #[test]
    fn test_unknown_event_type_is_ignored() {
        let body = json!({
            "data": { "attributes": { "type": "source.chargeable" } }
        });

        let event = parse_webhook_event(body.to_string().as_bytes()).unwrap();
        assert_eq!(event.event_type(), "source.chargeable");
        assert!(matches!(event, WebhookEvent::Ignored { .. }));
    }

    #[test]
    fn test_paid_event_without_intent_is_rejected() {
        let body = json!({
            "data": {
                "attributes": {
                    "type": "payment.paid",
                    "data": { "id": "pay_1", "attributes": {} }
                }
            }
        });

        assert!(matches!(
            parse_webhook_event(body.to_string().as_bytes()),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(parse_webhook_event(b"not json"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_checkout_body_shape() {
        let appointment_id = Uuid::new_v4();
        let request = CheckoutSessionRequest {
            appointment_id,
            user_id: Uuid::new_v4(),
            amount_cents: 65_000,
            currency: "PHP".to_string(),
            method: PaymentMethod::Gcash,
            item_name: "Gel Manicure".to_string(),
            description: "Gel Manicure booking".to_string(),
            success_url: "https://example.com/ok".to_string(),
            cancel_url: "https://example.com/no".to_string(),
        };

        let body = checkout_body(&request);
        let attributes = &body["data"]["attributes"];
        assert_eq!(attributes["line_items"][0]["amount"], 65_000);
        assert_eq!(attributes["line_items"][0]["currency"], "PHP");
        assert_eq!(attributes["line_items"][0]["quantity"], 1);
        assert_eq!(attributes["payment_method_types"][0], "gcash");
        assert_eq!(attributes["metadata"]["appointmentId"], appointment_id.to_string());
    }

    fn gel_request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            appointment_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount_cents: 65_000,
            currency: "PHP".to_string(),
            method: PaymentMethod::Card,
            item_name: "Gel Manicure".to_string(),
            description: "Gel Manicure booking".to_string(),
            success_url: "https://example.com/ok".to_string(),
            cancel_url: "https://example.com/no".to_string(),
        }
    }

    fn status_of(error: AppError) -> axum::http::StatusCode {
        use axum::response::IntoResponse;
        error.into_response().status()
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_a_server_error() {
        let client = PaymongoClient::new(&PaymongoConfig {
            secret_key: Some("sk_test_123".to_string()),
            api_base: "http://127.0.0.1:9/v1".to_string(),
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap();

        let err = client.create_checkout_session(gel_request()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(status_of(err), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_missing_secret_key_is_a_server_error() {
        let client = PaymongoClient::new(&PaymongoConfig::default()).unwrap();

        let err = client.create_checkout_session(gel_request()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(status_of(err), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
