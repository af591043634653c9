use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{domain::PaymentMethod, error::Result};

pub mod paymongo;

pub use paymongo::PaymongoClient;

/// What the booking flow asks the provider for: one line item paid with one method.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub appointment_id: Uuid,
    pub user_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub item_name: String,
    pub description: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A hosted checkout page opened by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
    pub payment_intent_id: String,
}

/// Hosted-checkout provider. A non-2xx answer surfaces as
/// [`crate::error::AppError::Upstream`] carrying the provider's payload.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> Result<CheckoutSession>;
}

/// A provider event reduced to what the booking flow reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Paid {
        payment_intent_id: String,
        external_payment_id: String,
        paid_at: Option<DateTime<Utc>>,
        appointment_id: Option<String>,
    },
    Failed {
        payment_intent_id: String,
        failed_code: Option<String>,
        failed_message: Option<String>,
    },
    Ignored {
        event_type: String,
    },
}

impl WebhookEvent {
    pub fn event_type(&self) -> &str {
        match self {
            WebhookEvent::Paid { .. } => "payment.paid",
            WebhookEvent::Failed { .. } => "payment.failed",
            WebhookEvent::Ignored { event_type } => event_type,
        }
    }
}
