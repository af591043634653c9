use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Appointment, AppointmentDetail},
    error::Result,
};

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Appointment>>> {
    let appointments = state.service_context.booking_service
        .list_for_user(current.user.id)
        .await?;
    Ok(Json(appointments))
}

pub async fn get_mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentDetail>> {
    let detail = state.service_context.booking_service
        .get_for_user(&current.user, id)
        .await?;
    Ok(Json(detail))
}
