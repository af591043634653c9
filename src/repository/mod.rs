use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod user_repository;
pub mod appointment_repository;
pub mod payment_repository;
pub mod appointment_type_repository;
pub mod faq_repository;
pub mod reminder_repository;
pub mod schedule_slot_repository;
pub mod error_log_repository;

pub use user_repository::SqliteUserRepository;
pub use appointment_repository::SqliteAppointmentRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use appointment_type_repository::SqliteAppointmentTypeRepository;
pub use faq_repository::SqliteFaqRepository;
pub use reminder_repository::SqliteReminderRepository;
pub use schedule_slot_repository::SqliteScheduleSlotRepository;
pub use error_log_repository::SqliteErrorLogRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, request: CreateUserRequest) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// The user together with their stored password hash.
    async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>>;
    async fn password_hash(&self, id: Uuid) -> Result<Option<String>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
    async fn update_profile(&self, id: Uuid, update: UpdateProfileRequest) -> Result<User>;
    async fn update_password(&self, id: Uuid, password: &str) -> Result<()>;
    async fn set_role(&self, id: Uuid, role: UserRole) -> Result<User>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Insert the appointment and its images in one transaction, unless the
    /// slot is already taken by a scheduled/completed appointment or by a
    /// pending one updated after `hold_cutoff`.
    async fn create_in_free_slot(
        &self,
        appointment: NewAppointment,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<Appointment>;
    /// Renew a pending appointment's hold on its slot. Conflict when another
    /// appointment occupies the slot by now.
    async fn refresh_hold(&self, id: Uuid, hold_cutoff: DateTime<Utc>) -> Result<Appointment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Appointment>>;
    async fn list(&self, filter: AppointmentFilter, limit: i64, offset: i64) -> Result<Vec<Appointment>>;
    /// Appointments starting in `[from, to)`, any status.
    async fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Appointment>>;
    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<Appointment>;
    async fn count_by_type(&self, appointment_type_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: NewPayment) -> Result<Payment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn find_by_intent_id(&self, payment_intent_id: &str) -> Result<Option<Payment>>;
    async fn list_by_appointment(&self, appointment_id: Uuid) -> Result<Vec<Payment>>;
    /// Mark the payment for `payment_intent_id` paid and, when its slot is
    /// still free, schedule its appointment, in a single transaction.
    /// `None` when no payment matches.
    async fn mark_paid(
        &self,
        payment_intent_id: &str,
        external_payment_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<(Payment, PaidOutcome)>>;
    /// Mark a pending payment failed. `None` when no payment matches.
    async fn mark_failed(
        &self,
        payment_intent_id: &str,
        failed_code: Option<&str>,
        failed_message: &str,
    ) -> Result<Option<Payment>>;
}

#[async_trait]
pub trait AppointmentTypeRepository: Send + Sync {
    async fn create(&self, request: CreateAppointmentTypeRequest) -> Result<AppointmentType>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AppointmentType>>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<AppointmentType>>;
    async fn list(&self, include_inactive: bool) -> Result<Vec<AppointmentType>>;
    async fn update(&self, id: Uuid, request: UpdateAppointmentTypeRequest) -> Result<AppointmentType>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn reorder(&self, ids: &[Uuid]) -> Result<()>;
    async fn seed_defaults(&self) -> Result<Vec<AppointmentType>>;
}

#[async_trait]
pub trait FaqRepository: Send + Sync {
    async fn create(&self, request: CreateFaqRequest) -> Result<Faq>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Faq>>;
    async fn list(&self, include_inactive: bool) -> Result<Vec<Faq>>;
    async fn update(&self, id: Uuid, request: UpdateFaqRequest) -> Result<Faq>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn reorder(&self, ids: &[Uuid]) -> Result<()>;
}

#[async_trait]
pub trait ReminderRepository: Send + Sync {
    async fn create(&self, request: CreateReminderRequest) -> Result<Reminder>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reminder>>;
    async fn list(&self, include_inactive: bool) -> Result<Vec<Reminder>>;
    async fn update(&self, id: Uuid, request: UpdateReminderRequest) -> Result<Reminder>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn reorder(&self, ids: &[Uuid]) -> Result<()>;
}

#[async_trait]
pub trait ScheduleSlotRepository: Send + Sync {
    async fn create(&self, request: CreateScheduleSlotRequest) -> Result<ScheduleSlot>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduleSlot>>;
    async fn list(&self, include_inactive: bool) -> Result<Vec<ScheduleSlot>>;
    async fn update(&self, id: Uuid, request: UpdateScheduleSlotRequest) -> Result<ScheduleSlot>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Sink for unexpected errors, readable from the back office.
#[async_trait]
pub trait ErrorLogRepository: Send + Sync {
    async fn record(&self, message: &str, context: &ErrorContext) -> Result<()>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ErrorLog>>;
}
