use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{handlers::PageQuery, middleware::auth::CurrentUser, state::AppState},
    domain::{Appointment, AppointmentDetail, AppointmentFilter, AppointmentStatus, ErrorLog},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Vec<Appointment>>> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            AppointmentStatus::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown status: {}", s)))?,
        ),
        None => None,
    };
    let page = PageQuery { limit: query.limit, offset: query.offset };

    let appointments = state.service_context.booking_service
        .list(
            AppointmentFilter { from: query.from, to: query.to, status },
            page.limit(),
            page.offset(),
        )
        .await?;
    Ok(Json(appointments))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentDetail>> {
    let detail = state.service_context.booking_service.get_detail(id).await?;
    Ok(Json(detail))
}

pub async fn update_appointment_status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Appointment>> {
    tracing::debug!("{} sets appointment {} to {}", current.user.email, id, request.status.as_str());
    let appointment = state.service_context.booking_service
        .update_status(id, request.status)
        .await?;
    Ok(Json(appointment))
}

pub async fn error_logs(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<ErrorLog>>> {
    let logs = state.service_context.error_log_repo
        .list(page.limit(), page.offset())
        .await?;
    Ok(Json(logs))
}
