//! FAQ and reminder management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{handlers::{ListQuery, ReorderRequest}, state::AppState},
    domain::{
        CreateFaqRequest, CreateReminderRequest, Faq, Reminder, UpdateFaqRequest,
        UpdateReminderRequest,
    },
    error::{AppError, Result},
};

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

fn optional_text(field: &str, value: &Option<String>) -> Result<()> {
    match value {
        Some(v) => require_text(field, v),
        None => Ok(()),
    }
}

// FAQs

pub async fn list_faqs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Faq>>> {
    let faqs = state.service_context.faq_repo
        .list(query.include_inactive.unwrap_or(true))
        .await?;
    Ok(Json(faqs))
}

pub async fn get_faq(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Faq>> {
    let faq = state.service_context.faq_repo.find_by_id(id).await?
        .ok_or_else(|| AppError::NotFound("FAQ not found".to_string()))?;
    Ok(Json(faq))
}

pub async fn create_faq(
    State(state): State<AppState>,
    Json(request): Json<CreateFaqRequest>,
) -> Result<(StatusCode, Json<Faq>)> {
    require_text("Question", &request.question)?;
    require_text("Answer", &request.answer)?;
    let faq = state.service_context.faq_repo.create(request).await?;
    Ok((StatusCode::CREATED, Json(faq)))
}

pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateFaqRequest>,
) -> Result<Json<Faq>> {
    optional_text("Question", &request.question)?;
    optional_text("Answer", &request.answer)?;
    let faq = state.service_context.faq_repo.update(id, request).await?;
    Ok(Json(faq))
}

pub async fn delete_faq(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    state.service_context.faq_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_faqs(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<StatusCode> {
    state.service_context.faq_repo.reorder(&request.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Reminders

pub async fn list_reminders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Reminder>>> {
    let reminders = state.service_context.reminder_repo
        .list(query.include_inactive.unwrap_or(true))
        .await?;
    Ok(Json(reminders))
}

pub async fn get_reminder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reminder>> {
    let reminder = state.service_context.reminder_repo.find_by_id(id).await?
        .ok_or_else(|| AppError::NotFound("Reminder not found".to_string()))?;
    Ok(Json(reminder))
}

pub async fn create_reminder(
    State(state): State<AppState>,
    Json(request): Json<CreateReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>)> {
    require_text("Title", &request.title)?;
    require_text("Body", &request.body)?;
    let reminder = state.service_context.reminder_repo.create(request).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn update_reminder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReminderRequest>,
) -> Result<Json<Reminder>> {
    optional_text("Title", &request.title)?;
    optional_text("Body", &request.body)?;
    let reminder = state.service_context.reminder_repo.update(id, request).await?;
    Ok(Json(reminder))
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.reminder_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_reminders(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<StatusCode> {
    state.service_context.reminder_repo.reorder(&request.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
