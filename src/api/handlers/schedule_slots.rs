use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{handlers::ListQuery, state::AppState},
    domain::{CreateScheduleSlotRequest, ScheduleSlot, UpdateScheduleSlotRequest},
    error::Result,
};

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ScheduleSlot>>> {
    let slots = state.service_context.booking_service
        .list_slots(query.include_inactive.unwrap_or(true))
        .await?;
    Ok(Json(slots))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleSlotRequest>,
) -> Result<(StatusCode, Json<ScheduleSlot>)> {
    let slot = state.service_context.booking_service.create_slot(request).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateScheduleSlotRequest>,
) -> Result<Json<ScheduleSlot>> {
    let slot = state.service_context.booking_service.update_slot(id, request).await?;
    Ok(Json(slot))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    state.service_context.booking_service.delete_slot(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn seed(State(state): State<AppState>) -> Result<Json<Vec<ScheduleSlot>>> {
    let slots = state.service_context.booking_service.seed_default_slots().await?;
    Ok(Json(slots))
}
