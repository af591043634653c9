use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub checkout_session_id: String,
    pub payment_intent_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub failed_code: Option<String>,
    pub failed_message: Option<String>,
    pub external_payment_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PAID" => Some(PaymentStatus::Paid),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Gcash,
    Card,
}

impl PaymentMethod {
    /// Name used both in storage and in the provider's `payment_method_types`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::Card => "card",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gcash" => Some(PaymentMethod::Gcash),
            "card" => Some(PaymentMethod::Card),
            _ => None,
        }
    }
}

/// A pending payment row to insert after the provider opened a session.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub appointment_id: Uuid,
    pub checkout_session_id: String,
    pub payment_intent_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub method: PaymentMethod,
}

/// What a paid event did to the booking behind the payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaidOutcome {
    /// The appointment is now scheduled.
    Confirmed,
    /// The payment was already paid; nothing changed.
    AlreadyPaid,
    /// The money was taken but the appointment could not be scheduled.
    NotScheduled { reason: String },
}

/// Convert a major-unit amount (e.g. pesos) into minor units.
pub fn to_minor_units(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    let cents = (amount * 100.0).round();
    if cents < 1.0 || cents > i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(1500.0), Some(150_000));
        assert_eq!(to_minor_units(99.99), Some(9_999));
        assert_eq!(to_minor_units(0.1 + 0.2), Some(30));
        assert_eq!(to_minor_units(0.0), None);
        assert_eq!(to_minor_units(-5.0), None);
        assert_eq!(to_minor_units(f64::NAN), None);
        assert_eq!(to_minor_units(0.001), None);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(PaymentMethod::parse("gcash"), Some(PaymentMethod::Gcash));
        assert_eq!(PaymentMethod::parse("card"), Some(PaymentMethod::Card));
        assert_eq!(PaymentMethod::parse("paymaya"), None);
        let json = serde_json::to_string(&PaymentMethod::Gcash).unwrap();
        assert_eq!(json, "\"gcash\"");
    }
}
