use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::Settings,
    domain::{
        Appointment, AppointmentStatus, AppointmentType, ErrorContext, InspirationImage,
        NewAppointment, NewPayment, PaidOutcome, PaymentMethod, PaymentStatus, User,
        to_minor_units,
    },
    error::{AppError, Result},
    payments::{
        CheckoutSessionRequest, PaymentGateway, WebhookEvent,
        paymongo::{parse_webhook_event, verify_webhook_signature},
    },
    repository::{AppointmentRepository, AppointmentTypeRepository, ErrorLogRepository, PaymentRepository},
    service::{booking_service::BookingService, report},
};

/// Booking form data submitted alongside a checkout.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingData {
    pub appointment_type_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Amount in major currency units, e.g. 650.00
    pub amount: f64,
    pub method: PaymentMethod,
    pub booking_data: BookingData,
    #[serde(default)]
    pub inspo_data: Vec<InspirationImage>,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    /// RFC 3339 start of the chosen slot
    pub combined_date_and_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetryRequest {
    pub amount: f64,
    pub method: PaymentMethod,
    pub appointment_id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub payment_intent_id: String,
}

const DEFAULT_FAILURE_MESSAGE: &str = "Unknown error";

pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    appointment_repo: Arc<dyn AppointmentRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    appointment_type_repo: Arc<dyn AppointmentTypeRepository>,
    booking_service: Arc<BookingService>,
    error_log: Arc<dyn ErrorLogRepository>,
    base_url: String,
    currency: String,
    webhook_secret: Option<String>,
}

/// The identity fields in a payment body, when sent, must name the session user.
fn ensure_actor(actor: &User, user_id: Option<Uuid>, user_email: Option<&str>) -> Result<()> {
    let other_id = user_id.is_some_and(|id| id != actor.id);
    let other_email = user_email.is_some_and(|email| !email.trim().eq_ignore_ascii_case(&actor.email));
    if other_id || other_email {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn amount_in_cents(amount: f64) -> Result<i64> {
    to_minor_units(amount)
        .ok_or_else(|| AppError::BadRequest("Amount must be greater than zero".to_string()))
}

/// The client-sent amount is charged as given; a differing list price is only logged.
fn differs_from_price(amount_cents: i64, appointment_type: &AppointmentType, appointment_id: Uuid) -> bool {
    if amount_cents == appointment_type.price_cents {
        return false;
    }
    tracing::warn!(
        "Charging {} for appointment {} but {} lists at {}",
        amount_cents,
        appointment_id,
        appointment_type.name,
        appointment_type.price_cents
    );
    true
}

impl PaymentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        appointment_repo: Arc<dyn AppointmentRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        appointment_type_repo: Arc<dyn AppointmentTypeRepository>,
        booking_service: Arc<BookingService>,
        error_log: Arc<dyn ErrorLogRepository>,
        settings: &Settings,
    ) -> Self {
        Self {
            gateway,
            appointment_repo,
            payment_repo,
            appointment_type_repo,
            booking_service,
            error_log,
            base_url: settings.server.base_url.trim_end_matches('/').to_string(),
            currency: settings.paymongo.currency.clone(),
            webhook_secret: settings.paymongo.webhook_secret.clone().filter(|s| !s.is_empty()),
        }
    }

    /// Create the appointment, open a hosted checkout for it and record the
    /// pending payment.
    pub async fn checkout(&self, actor: &User, request: CheckoutRequest) -> Result<CheckoutResponse> {
        let context = ErrorContext::new("/api/payments/checkout", "checkout")
            .with_user(actor.id, actor.email.clone());

        ensure_actor(actor, request.user_id, request.user_email.as_deref())?;
        let amount_cents = amount_in_cents(request.amount)?;

        let booking = request.booking_data;
        if booking.full_name.trim().is_empty() {
            return Err(AppError::Validation("Full name is required".to_string()));
        }

        let appointment_type = report(
            self.error_log.as_ref(),
            &context,
            self.appointment_type_repo.find_by_id(booking.appointment_type_id).await,
        )
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::BadRequest("Unknown or inactive appointment type".to_string()))?;

        let appointment = report(
            self.error_log.as_ref(),
            &context,
            self.booking_service
                .book(NewAppointment {
                    user_id: actor.id,
                    appointment_type_id: appointment_type.id,
                    scheduled_at: request.combined_date_and_time,
                    full_name: booking.full_name.trim().to_string(),
                    phone: booking.phone.filter(|p| !p.trim().is_empty()),
                    notes: booking.notes.filter(|n| !n.trim().is_empty()),
                    inspirations: request.inspo_data,
                })
                .await,
        )
        .await?;

        tracing::info!(
            "Appointment {} created for {} at {}",
            appointment.id,
            actor.email,
            appointment.scheduled_at
        );
        differs_from_price(amount_cents, &appointment_type, appointment.id);

        self.open_checkout(&appointment, &appointment_type, amount_cents, request.method, &context)
            .await
    }

    /// Open a new checkout for an appointment still awaiting payment.
    pub async fn retry(&self, actor: &User, request: RetryRequest) -> Result<CheckoutResponse> {
        let context = ErrorContext::new("/api/payments/retry", "retry")
            .with_user(actor.id, actor.email.clone());

        ensure_actor(actor, request.user_id, request.user_email.as_deref())?;
        let amount_cents = amount_in_cents(request.amount)?;

        let appointment = report(
            self.error_log.as_ref(),
            &context,
            self.appointment_repo.find_by_id(request.appointment_id).await,
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

        if appointment.user_id != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden);
        }
        if appointment.status != AppointmentStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Appointment is {} and cannot be paid again",
                appointment.status.as_str()
            )));
        }

        let appointment_type = report(
            self.error_log.as_ref(),
            &context,
            self.appointment_type_repo.find_by_id(appointment.appointment_type_id).await,
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment type not found".to_string()))?;

        let appointment = report(
            self.error_log.as_ref(),
            &context,
            self.booking_service.refresh_hold(appointment.id).await,
        )
        .await?;
        differs_from_price(amount_cents, &appointment_type, appointment.id);

        self.open_checkout(&appointment, &appointment_type, amount_cents, request.method, &context)
            .await
    }

    async fn open_checkout(
        &self,
        appointment: &Appointment,
        appointment_type: &AppointmentType,
        amount_cents: i64,
        method: PaymentMethod,
        context: &ErrorContext,
    ) -> Result<CheckoutResponse> {
        let local_start = appointment
            .scheduled_at
            .with_timezone(&self.booking_service.rules().offset);

        let session = report(
            self.error_log.as_ref(),
            context,
            self.gateway
                .create_checkout_session(CheckoutSessionRequest {
                    appointment_id: appointment.id,
                    user_id: appointment.user_id,
                    amount_cents,
                    currency: self.currency.clone(),
                    method,
                    item_name: appointment_type.name.clone(),
                    description: format!(
                        "{} on {}",
                        appointment_type.name,
                        local_start.format("%b %-d, %Y %-I:%M %p")
                    ),
                    success_url: format!(
                        "{}/booking/success?appointmentId={}",
                        self.base_url, appointment.id
                    ),
                    cancel_url: format!(
                        "{}/booking/cancelled?appointmentId={}",
                        self.base_url, appointment.id
                    ),
                })
                .await,
        )
        .await?;

        let payment = report(
            self.error_log.as_ref(),
            context,
            self.payment_repo
                .create(NewPayment {
                    appointment_id: appointment.id,
                    checkout_session_id: session.session_id,
                    payment_intent_id: session.payment_intent_id.clone(),
                    amount_cents,
                    currency: self.currency.clone(),
                    method,
                })
                .await,
        )
        .await?;

        tracing::info!(
            "Payment {} pending for appointment {} (intent {})",
            payment.id,
            appointment.id,
            payment.payment_intent_id
        );

        Ok(CheckoutResponse {
            checkout_url: session.checkout_url,
            payment_intent_id: session.payment_intent_id,
        })
    }

    pub fn verifies_signatures(&self) -> bool {
        self.webhook_secret.is_some()
    }

    /// Apply a provider event to the payment it names and its appointment.
    pub async fn handle_webhook(&self, payload: &[u8], signature: Option<&str>) -> Result<()> {
        if let Some(ref secret) = self.webhook_secret {
            let header = signature.ok_or_else(|| {
                tracing::warn!("Webhook rejected: missing signature header");
                AppError::Unauthorized
            })?;
            if !verify_webhook_signature(secret, payload, header)? {
                tracing::warn!("Webhook rejected: signature mismatch");
                return Err(AppError::Unauthorized);
            }
        }

        let event = parse_webhook_event(payload)?;
        let context = ErrorContext::new("/api/payments/webhook", "handle_webhook");

        match event {
            WebhookEvent::Paid {
                payment_intent_id,
                external_payment_id,
                paid_at,
                appointment_id,
            } => {
                let paid_at = paid_at.unwrap_or_else(Utc::now);
                let applied = report(
                    self.error_log.as_ref(),
                    &context,
                    self.payment_repo
                        .mark_paid(&payment_intent_id, &external_payment_id, paid_at)
                        .await,
                )
                .await?;

                let Some((payment, outcome)) = applied else {
                    tracing::warn!("payment.paid for unknown payment intent {}", payment_intent_id);
                    return Ok(());
                };

                if let Some(claimed) = appointment_id {
                    if claimed != payment.appointment_id.to_string() {
                        tracing::warn!(
                            "payment.paid metadata names appointment {} but intent {} belongs to {}",
                            claimed,
                            payment_intent_id,
                            payment.appointment_id
                        );
                    }
                }

                match outcome {
                    PaidOutcome::Confirmed => {
                        tracing::info!(
                            "Payment {} paid, appointment {} confirmed",
                            payment.id,
                            payment.appointment_id
                        );
                    }
                    PaidOutcome::AlreadyPaid => {
                        tracing::debug!("payment.paid redelivered for intent {}", payment_intent_id);
                    }
                    PaidOutcome::NotScheduled { reason } => {
                        let message = format!(
                            "Payment {} received for intent {} but not applied: {}; refund required",
                            payment.id, payment_intent_id, reason
                        );
                        tracing::error!("{}", message);
                        if let Err(e) = self.error_log.record(&message, &context).await {
                            tracing::error!("Failed to record error log entry: {}", e);
                        }
                    }
                }
            }
            WebhookEvent::Failed {
                payment_intent_id,
                failed_code,
                failed_message,
            } => {
                let message = failed_message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                let payment = report(
                    self.error_log.as_ref(),
                    &context,
                    self.payment_repo
                        .mark_failed(&payment_intent_id, failed_code.as_deref(), &message)
                        .await,
                )
                .await?;

                match payment {
                    None => {
                        tracing::warn!("payment.failed for unknown payment intent {}", payment_intent_id);
                    }
                    Some(payment) if payment.status == PaymentStatus::Failed => {
                        tracing::info!("Payment {} failed: {}", payment.id, message);
                    }
                    Some(payment) => {
                        tracing::warn!(
                            "payment.failed for intent {} ignored: payment is already {}",
                            payment_intent_id,
                            payment.status.as_str()
                        );
                    }
                }
            }
            WebhookEvent::Ignored { event_type } => {
                tracing::debug!("Ignoring webhook event {}", event_type);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "client@example.com".to_string(),
            full_name: "Client".to_string(),
            phone: None,
            role: UserRole::Customer,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_actor_fields_are_optional() {
        let actor = user();
        assert!(ensure_actor(&actor, None, None).is_ok());
        assert!(ensure_actor(&actor, Some(actor.id), Some("CLIENT@example.com")).is_ok());
    }

    #[test]
    fn test_actor_mismatch_is_forbidden() {
        let actor = user();
        assert!(matches!(
            ensure_actor(&actor, Some(Uuid::new_v4()), None),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            ensure_actor(&actor, None, Some("someone@else.com")),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert_eq!(amount_in_cents(650.0).unwrap(), 65_000);
        assert!(amount_in_cents(0.0).is_err());
        assert!(amount_in_cents(-5.0).is_err());
    }

    #[test]
    fn test_price_mismatch_is_flagged() {
        let gel = AppointmentType {
            id: Uuid::new_v4(),
            name: "Gel Manicure".to_string(),
            slug: "gel-manicure".to_string(),
            description: None,
            price_cents: 65_000,
            duration_minutes: 60,
            sort_order: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!differs_from_price(65_000, &gel, Uuid::new_v4()));
        assert!(differs_from_price(100, &gel, Uuid::new_v4()));
    }

    #[test]
    fn test_checkout_request_wire_format() {
        let body = serde_json::json!({
            "amount": 650.5,
            "method": "gcash",
            "bookingData": {
                "appointmentTypeId": Uuid::nil(),
                "fullName": "Ana Cruz"
            },
            "inspoData": [
                { "file_name": "nails.png", "path": "/uploads/abc.png", "content_type": "image/png", "size": 1024 }
            ],
            "combinedDateAndTime": "2030-01-01T10:00:00+08:00"
        });

        let request: CheckoutRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.method, PaymentMethod::Gcash);
        assert_eq!(request.inspo_data.len(), 1);
        assert!(request.user_id.is_none());
        assert_eq!(request.combined_date_and_time.to_rfc3339(), "2030-01-01T02:00:00+00:00");
    }
}
