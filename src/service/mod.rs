pub mod account_service;
pub mod appointment_type_service;
pub mod booking_service;
pub mod payment_service;

use std::sync::Arc;
use sqlx::SqlitePool;

use crate::auth::AuthService;
use crate::config::Settings;
use crate::domain::{BookingRules, ErrorContext};
use crate::error::{AppError, Result};
use crate::payments::PaymentGateway;
use crate::repository::*;
use account_service::AccountService;
use appointment_type_service::AppointmentTypeService;
use booking_service::BookingService;
use payment_service::PaymentService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub appointment_repo: Arc<dyn AppointmentRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub faq_repo: Arc<dyn FaqRepository>,
    pub reminder_repo: Arc<dyn ReminderRepository>,
    pub error_log_repo: Arc<dyn ErrorLogRepository>,
    pub auth_service: Arc<AuthService>,
    pub account_service: Arc<AccountService>,
    pub appointment_type_service: Arc<AppointmentTypeService>,
    pub booking_service: Arc<BookingService>,
    pub payment_service: Arc<PaymentService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        settings: &Settings,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self> {
        let rules = BookingRules::new(
            settings.booking.utc_offset_minutes,
            settings.booking.pending_hold_minutes,
        )
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Invalid booking.utc_offset_minutes: {}",
                settings.booking.utc_offset_minutes
            ))
        })?;

        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let appointment_repo: Arc<dyn AppointmentRepository> =
            Arc::new(SqliteAppointmentRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let appointment_type_repo: Arc<dyn AppointmentTypeRepository> =
            Arc::new(SqliteAppointmentTypeRepository::new(db_pool.clone()));
        let schedule_slot_repo: Arc<dyn ScheduleSlotRepository> =
            Arc::new(SqliteScheduleSlotRepository::new(db_pool.clone()));
        let faq_repo: Arc<dyn FaqRepository> = Arc::new(SqliteFaqRepository::new(db_pool.clone()));
        let reminder_repo: Arc<dyn ReminderRepository> =
            Arc::new(SqliteReminderRepository::new(db_pool.clone()));
        let error_log_repo: Arc<dyn ErrorLogRepository> =
            Arc::new(SqliteErrorLogRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            db_pool.clone(),
            settings.auth.session_duration_hours,
            settings.auth.secure_cookies,
        ));

        let account_service = Arc::new(AccountService::new(
            user_repo.clone(),
            auth_service.clone(),
        ));
        let appointment_type_service = Arc::new(AppointmentTypeService::new(
            appointment_type_repo.clone(),
            appointment_repo.clone(),
        ));
        let booking_service = Arc::new(BookingService::new(
            appointment_repo.clone(),
            payment_repo.clone(),
            schedule_slot_repo,
            rules,
        ));
        let payment_service = Arc::new(PaymentService::new(
            gateway,
            appointment_repo.clone(),
            payment_repo.clone(),
            appointment_type_repo,
            booking_service.clone(),
            error_log_repo.clone(),
            settings,
        ));

        Ok(Self {
            user_repo,
            appointment_repo,
            payment_repo,
            faq_repo,
            reminder_repo,
            error_log_repo,
            auth_service,
            account_service,
            appointment_type_service,
            booking_service,
            payment_service,
            db_pool,
        })
    }
}

/// Write unexpected failures to the error log; caller mistakes are returned
/// untouched.
pub(crate) async fn report<T>(
    sink: &dyn ErrorLogRepository,
    context: &ErrorContext,
    result: Result<T>,
) -> Result<T> {
    if let Err(ref e) = result {
        let expected = e.is_client_error() || matches!(e, AppError::Upstream { .. });
        if !expected {
            if let Err(log_err) = sink.record(&e.to_string(), context).await {
                tracing::error!("Failed to write error log: {}", log_err);
            }
        }
    }
    result
}
