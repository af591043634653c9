use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    api::state::AppState,
    domain::{AppointmentType, CalendarDay, Faq, Reminder},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub async fn list_appointment_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<AppointmentType>>> {
    let types = state.service_context.appointment_type_service.list(false).await?;
    Ok(Json(types))
}

pub async fn list_faqs(State(state): State<AppState>) -> Result<Json<Vec<Faq>>> {
    let faqs = state.service_context.faq_repo.list(false).await?;
    Ok(Json(faqs))
}

pub async fn list_reminders(State(state): State<AppState>) -> Result<Json<Vec<Reminder>>> {
    let reminders = state.service_context.reminder_repo.list(false).await?;
    Ok(Json(reminders))
}

pub async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarDay>>> {
    let days = state.service_context.booking_service
        .calendar(query.from, query.to)
        .await?;
    Ok(Json(days))
}
