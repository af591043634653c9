use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{handlers::{ListQuery, ReorderRequest}, state::AppState},
    domain::{AppointmentType, CreateAppointmentTypeRequest, UpdateAppointmentTypeRequest},
    error::{AppError, Result},
};

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AppointmentType>>> {
    let include_inactive = query.include_inactive.unwrap_or(false);
    let types = state.service_context.appointment_type_service.list(include_inactive).await?;
    Ok(Json(types))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentType>> {
    let appointment_type = state.service_context.appointment_type_service.get(id).await?
        .ok_or_else(|| AppError::NotFound("Appointment type not found".to_string()))?;
    Ok(Json(appointment_type))
}

pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<AppointmentType>> {
    let appointment_type = state.service_context.appointment_type_service.get_by_slug(&slug).await?
        .ok_or_else(|| AppError::NotFound("Appointment type not found".to_string()))?;
    Ok(Json(appointment_type))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateAppointmentTypeRequest>,
) -> Result<(StatusCode, Json<AppointmentType>)> {
    let created = state.service_context.appointment_type_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentTypeRequest>,
) -> Result<Json<AppointmentType>> {
    let updated = state.service_context.appointment_type_service.update(id, request).await?;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.appointment_type_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<StatusCode> {
    state.service_context.appointment_type_service.reorder(&request.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn seed(State(state): State<AppState>) -> Result<Json<Vec<AppointmentType>>> {
    let types = state.service_context.appointment_type_service.seed_defaults().await?;
    Ok(Json(types))
}
