use std::sync::Arc;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    domain::{
        Appointment, AppointmentDetail, AppointmentFilter, AppointmentStatus, BookingRules,
        CalendarDay, CreateScheduleSlotRequest, NewAppointment, ScheduleSlot,
        UpdateScheduleSlotRequest, User, default_schedule_slots, validate_slot,
    },
    error::{AppError, Result},
    repository::{AppointmentRepository, PaymentRepository, ScheduleSlotRepository},
};

pub const MAX_CALENDAR_DAYS: i64 = 62;

/// Weekly slots, the calendar built from them, and the appointments placed on it.
pub struct BookingService {
    appointment_repo: Arc<dyn AppointmentRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    slot_repo: Arc<dyn ScheduleSlotRepository>,
    rules: BookingRules,
}

impl BookingService {
    pub fn new(
        appointment_repo: Arc<dyn AppointmentRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        slot_repo: Arc<dyn ScheduleSlotRepository>,
        rules: BookingRules,
    ) -> Self {
        Self {
            appointment_repo,
            payment_repo,
            slot_repo,
            rules,
        }
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    pub async fn calendar(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<CalendarDay>> {
        if from > to {
            return Err(AppError::BadRequest("'from' must not be after 'to'".to_string()));
        }
        if from.year() < 1970 || to.year() > 9999 {
            return Err(AppError::BadRequest("Calendar dates are out of range".to_string()));
        }
        if (to - from).num_days() + 1 > MAX_CALENDAR_DAYS {
            return Err(AppError::BadRequest(format!(
                "Calendar range is limited to {} days",
                MAX_CALENDAR_DAYS
            )));
        }

        let slots = self.slot_repo.list(false).await?;
        let window_start = self.rules.slot_start(from, NaiveTime::MIN);
        let window_end = match to.succ_opt() {
            Some(next) => self.rules.slot_start(next, NaiveTime::MIN),
            None => DateTime::<Utc>::MAX_UTC,
        };
        let appointments = self.appointment_repo.list_between(window_start, window_end).await?;

        Ok(self.rules.build_calendar(&slots, &appointments, from, to, Utc::now()))
    }

    /// The active slot a requested start time lands on.
    pub async fn check_bookable(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> Result<ScheduleSlot> {
        if at <= now {
            return Err(AppError::BadRequest("Appointment time must be in the future".to_string()));
        }

        let slots = self.slot_repo.list(false).await?;
        self.rules
            .find_slot(&slots, at)
            .cloned()
            .ok_or_else(|| {
                AppError::BadRequest("Requested time is not an open appointment slot".to_string())
            })
    }

    /// Place a pending appointment on a free slot.
    pub async fn book(&self, appointment: NewAppointment) -> Result<Appointment> {
        let now = Utc::now();
        self.check_bookable(appointment.scheduled_at, now).await?;
        self.appointment_repo
            .create_in_free_slot(appointment, now - self.rules.pending_hold)
            .await
    }

    pub async fn refresh_hold(&self, appointment_id: Uuid) -> Result<Appointment> {
        let cutoff = Utc::now() - self.rules.pending_hold;
        self.appointment_repo.refresh_hold(appointment_id, cutoff).await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Appointment>> {
        self.appointment_repo.find_by_id(id).await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Appointment>> {
        self.appointment_repo.list_by_user(user_id).await
    }

    /// One of the user's own appointments. Someone else's reads as missing.
    pub async fn get_for_user(&self, user: &User, id: Uuid) -> Result<AppointmentDetail> {
        let detail = self.get_detail(id).await?;
        if detail.appointment.user_id != user.id {
            return Err(AppError::NotFound("Appointment not found".to_string()));
        }
        Ok(detail)
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<AppointmentDetail> {
        let appointment = self.appointment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
        let payments = self.payment_repo.list_by_appointment(id).await?;

        Ok(AppointmentDetail { appointment, payments })
    }

    pub async fn list(&self, filter: AppointmentFilter, limit: i64, offset: i64) -> Result<Vec<Appointment>> {
        self.appointment_repo.list(filter, limit, offset).await
    }

    pub async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<Appointment> {
        let appointment = self.appointment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

        if !appointment.status.can_transition_to(status) {
            return Err(AppError::Conflict(format!(
                "Cannot change appointment from {} to {}",
                appointment.status.as_str(),
                status.as_str()
            )));
        }

        tracing::info!(
            "Appointment {} moved from {} to {}",
            id,
            appointment.status.as_str(),
            status.as_str()
        );
        self.appointment_repo.update_status(id, status).await
    }

    pub async fn list_slots(&self, include_inactive: bool) -> Result<Vec<ScheduleSlot>> {
        self.slot_repo.list(include_inactive).await
    }

    pub async fn create_slot(&self, request: CreateScheduleSlotRequest) -> Result<ScheduleSlot> {
        validate_slot(request.weekday, request.start_time, request.end_time)
            .map_err(AppError::BadRequest)?;
        self.slot_repo.create(request).await
    }

    pub async fn update_slot(&self, id: Uuid, request: UpdateScheduleSlotRequest) -> Result<ScheduleSlot> {
        let existing = self.slot_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Schedule slot not found".to_string()))?;

        validate_slot(
            request.weekday.unwrap_or(existing.weekday),
            request.start_time.unwrap_or(existing.start_time),
            request.end_time.unwrap_or(existing.end_time),
        )
        .map_err(AppError::BadRequest)?;

        self.slot_repo.update(id, request).await
    }

    pub async fn delete_slot(&self, id: Uuid) -> Result<()> {
        self.slot_repo.delete(id).await
    }

    /// Add the default weekly openings that do not exist yet.
    pub async fn seed_default_slots(&self) -> Result<Vec<ScheduleSlot>> {
        let existing = self.slot_repo.list(true).await?;
        let mut created = Vec::new();

        for (weekday, start_time, end_time) in default_schedule_slots() {
            if existing
                .iter()
                .any(|s| s.weekday == weekday && s.start_time == start_time)
            {
                continue;
            }
            created.push(
                self.slot_repo
                    .create(CreateScheduleSlotRequest { weekday, start_time, end_time })
                    .await?,
            );
        }

        Ok(created)
    }
}
