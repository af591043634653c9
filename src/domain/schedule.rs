use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Appointment, AppointmentStatus};

/// A recurring weekly opening, e.g. every Tuesday 10:00-11:30 (salon time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub id: Uuid,
    /// 0 = Monday ... 6 = Sunday
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleSlotRequest {
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateScheduleSlotRequest {
    pub weekday: Option<u8>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Available,
    Held,
    Booked,
    Past,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarSlot {
    pub slot_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub starts_at: DateTime<Utc>,
    pub state: SlotState,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub weekday: u8,
    pub slots: Vec<CalendarSlot>,
}

/// Rules shared by the calendar view and by booking.
#[derive(Debug, Clone, Copy)]
pub struct BookingRules {
    pub offset: FixedOffset,
    pub pending_hold: Duration,
}

impl BookingRules {
    pub fn new(utc_offset_minutes: i32, pending_hold_minutes: i64) -> Option<Self> {
        Some(Self {
            offset: FixedOffset::east_opt(utc_offset_minutes * 60)?,
            pending_hold: Duration::minutes(pending_hold_minutes.max(0)),
        })
    }

    /// When a slot starts on a given local date, as a UTC instant.
    pub fn slot_start(&self, date: NaiveDate, start_time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(start_time);
        let offset = Duration::seconds(self.offset.local_minus_utc() as i64);
        Utc.from_utc_datetime(&(local - offset))
    }

    /// The local calendar date an instant falls on.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// How an appointment occupies its slot at `now`, if at all.
    pub fn occupancy(&self, appointment: &Appointment, now: DateTime<Utc>) -> Option<SlotState> {
        match appointment.status {
            AppointmentStatus::Scheduled | AppointmentStatus::Completed => Some(SlotState::Booked),
            AppointmentStatus::Pending if appointment.updated_at > now - self.pending_hold => {
                Some(SlotState::Held)
            }
            AppointmentStatus::Pending | AppointmentStatus::Cancelled => None,
        }
    }

    /// The active slot an instant starts exactly on.
    pub fn find_slot<'a>(
        &self,
        slots: &'a [ScheduleSlot],
        at: DateTime<Utc>,
    ) -> Option<&'a ScheduleSlot> {
        let local = at.with_timezone(&self.offset);
        let weekday = local.weekday().num_days_from_monday() as u8;
        let time = local.time();
        slots
            .iter()
            .find(|s| s.is_active && s.weekday == weekday && s.start_time == time)
    }

    /// State of the slot starting at `starts_at` given the appointments around it.
    pub fn slot_state(
        &self,
        starts_at: DateTime<Utc>,
        appointments: &[Appointment],
        now: DateTime<Utc>,
    ) -> SlotState {
        let mut state = None;
        for appointment in appointments.iter().filter(|a| a.scheduled_at == starts_at) {
            match self.occupancy(appointment, now) {
                Some(SlotState::Booked) => return SlotState::Booked,
                Some(other) => state = Some(other),
                None => {}
            }
        }

        match state {
            Some(s) => s,
            None if starts_at <= now => SlotState::Past,
            None => SlotState::Available,
        }
    }

    /// Lay the weekly slot templates over each date in `from..=to` and mark
    /// every slot with its booking state.
    pub fn build_calendar(
        &self,
        slots: &[ScheduleSlot],
        appointments: &[Appointment],
        from: NaiveDate,
        to: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<CalendarDay> {
        let mut active: Vec<&ScheduleSlot> = slots.iter().filter(|s| s.is_active).collect();
        active.sort_by_key(|s| (s.weekday, s.start_time));

        let mut days = Vec::new();
        let mut date = from;
        while date <= to {
            let weekday = date.weekday().num_days_from_monday() as u8;
            let day_slots = active
                .iter()
                .filter(|s| s.weekday == weekday)
                .map(|slot| {
                    let starts_at = self.slot_start(date, slot.start_time);
                    CalendarSlot {
                        slot_id: slot.id,
                        start_time: slot.start_time,
                        end_time: slot.end_time,
                        starts_at,
                        state: self.slot_state(starts_at, appointments, now),
                    }
                })
                .collect();

            days.push(CalendarDay {
                date,
                weekday,
                slots: day_slots,
            });

            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        days
    }
}

/// Check the shape of a slot before it is stored.
pub fn validate_slot(weekday: u8, start_time: NaiveTime, end_time: NaiveTime) -> Result<(), String> {
    if weekday > 6 {
        return Err(format!("Invalid weekday {}: expected 0 (Monday) to 6 (Sunday)", weekday));
    }
    if start_time >= end_time {
        return Err("Slot start time must be before its end time".to_string());
    }
    Ok(())
}

/// Default weekly openings to seed: Tuesday to Sunday, three slots a day.
pub fn default_schedule_slots() -> Vec<(u8, NaiveTime, NaiveTime)> {
    let times = [(10, 12), (13, 15), (16, 18)];
    (1u8..=6)
        .flat_map(|weekday| {
            times.iter().filter_map(move |&(start, end)| {
                Some((
                    weekday,
                    NaiveTime::from_hms_opt(start, 0, 0)?,
                    NaiveTime::from_hms_opt(end, 0, 0)?,
                ))
            })
        })
        .collect()
}
