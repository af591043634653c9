use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{AppointmentStatus, NewPayment, PaidOutcome, Payment, PaymentMethod, PaymentStatus},
    error::{AppError, Result},
    repository::PaymentRepository,
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    appointment_id: String,
    checkout_session_id: String,
    payment_intent_id: String,
    amount_cents: i64,
    currency: String,
    method: String,
    status: String,
    failed_code: Option<String>,
    failed_message: Option<String>,
    external_payment_id: Option<String>,
    paid_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, appointment_id, checkout_session_id, payment_intent_id,
           amount_cents, currency, method, status, failed_code,
           failed_message, external_payment_id, paid_at, created_at, updated_at
    FROM payments
"#;

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            appointment_id: Uuid::parse_str(&row.appointment_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            checkout_session_id: row.checkout_session_id,
            payment_intent_id: row.payment_intent_id,
            amount_cents: row.amount_cents,
            currency: row.currency,
            method: PaymentMethod::parse(&row.method)
                .ok_or_else(|| AppError::Database(format!("Invalid payment method: {}", row.method)))?,
            status: PaymentStatus::parse(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid payment status: {}", row.status)))?,
            failed_code: row.failed_code,
            failed_message: row.failed_message,
            external_payment_id: row.external_payment_id,
            paid_at: row.paid_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: NewPayment) -> Result<Payment> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, appointment_id, checkout_session_id, payment_intent_id,
                amount_cents, currency, method, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(payment.appointment_id.to_string())
        .bind(&payment.checkout_session_id)
        .bind(&payment.payment_intent_id)
        .bind(payment.amount_cents)
        .bind(&payment.currency)
        .bind(payment.method.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created payment".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!("{} WHERE id = ?", SELECT_PAYMENT))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn find_by_intent_id(&self, payment_intent_id: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            &format!("{} WHERE payment_intent_id = ?", SELECT_PAYMENT)
        )
        .bind(payment_intent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn list_by_appointment(&self, appointment_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            &format!("{} WHERE appointment_id = ? ORDER BY created_at DESC", SELECT_PAYMENT)
        )
        .bind(appointment_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_payment)
            .collect()
    }

    async fn mark_paid(
        &self,
        payment_intent_id: &str,
        external_payment_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<(Payment, PaidOutcome)>> {
        let now = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        let current: Option<(String, String)> = sqlx::query_as(
            "SELECT appointment_id, status FROM payments WHERE payment_intent_id = ?"
        )
        .bind(payment_intent_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((appointment_id, payment_status)) = current else {
            return Ok(None);
        };

        if payment_status == PaymentStatus::Paid.as_str() {
            tx.rollback().await?;
            return Ok(self
                .find_by_intent_id(payment_intent_id)
                .await?
                .map(|payment| (payment, PaidOutcome::AlreadyPaid)));
        }

        // FAILED is not final: a later attempt on the same session can still pay
        sqlx::query(
            r#"
            UPDATE payments
            SET status = ?,
                external_payment_id = ?,
                paid_at = ?,
                updated_at = ?
            WHERE payment_intent_id = ? AND status IN (?, ?)
            "#
        )
        .bind(PaymentStatus::Paid.as_str())
        .bind(external_payment_id)
        .bind(paid_at.naive_utc())
        .bind(now)
        .bind(payment_intent_id)
        .bind(PaymentStatus::Pending.as_str())
        .bind(PaymentStatus::Failed.as_str())
        .execute(&mut *tx)
        .await?;

        let (appointment_status, scheduled_at): (String, NaiveDateTime) = sqlx::query_as(
            "SELECT status, scheduled_at FROM appointments WHERE id = ?"
        )
        .bind(&appointment_id)
        .fetch_one(&mut *tx)
        .await?;

        let outcome = if appointment_status != AppointmentStatus::Pending.as_str() {
            PaidOutcome::NotScheduled {
                reason: format!("appointment {} is {}", appointment_id, appointment_status),
            }
        } else {
            let booked_by: Option<String> = sqlx::query_scalar(
                r#"
                SELECT id FROM appointments
                WHERE scheduled_at = ? AND id != ? AND status IN (?, ?)
                LIMIT 1
                "#
            )
            .bind(scheduled_at)
            .bind(&appointment_id)
            .bind(AppointmentStatus::Scheduled.as_str())
            .bind(AppointmentStatus::Completed.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            match booked_by {
                Some(other) => PaidOutcome::NotScheduled {
                    reason: format!(
                        "slot of appointment {} is already booked by appointment {}",
                        appointment_id, other
                    ),
                },
                None => {
                    sqlx::query("UPDATE appointments SET status = ?, updated_at = ? WHERE id = ?")
                        .bind(AppointmentStatus::Scheduled.as_str())
                        .bind(now)
                        .bind(&appointment_id)
                        .execute(&mut *tx)
                        .await?;
                    PaidOutcome::Confirmed
                }
            }
        };

        tx.commit().await?;

        Ok(self
            .find_by_intent_id(payment_intent_id)
            .await?
            .map(|payment| (payment, outcome)))
    }

    async fn mark_failed(
        &self,
        payment_intent_id: &str,
        failed_code: Option<&str>,
        failed_message: &str,
    ) -> Result<Option<Payment>> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE payments
            SET status = ?,
                failed_code = ?,
                failed_message = ?,
                updated_at = ?
            WHERE payment_intent_id = ? AND status = ?
            "#
        )
        .bind(PaymentStatus::Failed.as_str())
        .bind(failed_code)
        .bind(failed_message)
        .bind(now)
        .bind(payment_intent_id)
        .bind(PaymentStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_intent_id(payment_intent_id).await
    }
}
