use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{AppointmentType, CreateAppointmentTypeRequest, UpdateAppointmentTypeRequest, slugify},
    error::{AppError, Result},
    repository::{AppointmentRepository, AppointmentTypeRepository},
};

pub struct AppointmentTypeService {
    repo: Arc<dyn AppointmentTypeRepository>,
    appointment_repo: Arc<dyn AppointmentRepository>,
}

fn validate_pricing(price_cents: Option<i64>, duration_minutes: Option<i32>) -> Result<()> {
    if let Some(price) = price_cents {
        if price < 0 {
            return Err(AppError::BadRequest("Price cannot be negative".to_string()));
        }
    }
    if let Some(duration) = duration_minutes {
        if duration <= 0 {
            return Err(AppError::BadRequest("Duration must be positive".to_string()));
        }
    }
    Ok(())
}

impl AppointmentTypeService {
    pub fn new(
        repo: Arc<dyn AppointmentTypeRepository>,
        appointment_repo: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self { repo, appointment_repo }
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<AppointmentType>> {
        self.repo.list(include_inactive).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<AppointmentType>> {
        self.repo.find_by_id(id).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<AppointmentType>> {
        self.repo.find_by_slug(slug).await
    }

    pub async fn create(&self, mut request: CreateAppointmentTypeRequest) -> Result<AppointmentType> {
        if request.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }
        validate_pricing(Some(request.price_cents), Some(request.duration_minutes))?;

        let slug = match request.slug.take() {
            Some(s) if !s.trim().is_empty() => slugify(&s),
            _ => slugify(&request.name),
        };
        if slug.is_empty() {
            return Err(AppError::BadRequest("Name must contain letters or digits".to_string()));
        }

        if self.repo.find_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Appointment type with slug '{}' already exists",
                slug
            )));
        }

        request.slug = Some(slug);
        self.repo.create(request).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateAppointmentTypeRequest) -> Result<AppointmentType> {
        if let Some(ref name) = request.name {
            if name.trim().is_empty() {
                return Err(AppError::BadRequest("Name cannot be empty".to_string()));
            }
        }
        validate_pricing(request.price_cents, request.duration_minutes)?;

        self.repo.update(id, request).await
    }

    /// Delete a service nobody has booked yet.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(AppError::NotFound("Appointment type not found".to_string()));
        }

        let usage_count = self.appointment_repo.count_by_type(id).await?;
        if usage_count > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete appointment type: {} appointments still use it. Deactivate instead.",
                usage_count
            )));
        }

        self.repo.delete(id).await
    }

    pub async fn reorder(&self, ids: &[Uuid]) -> Result<()> {
        self.repo.reorder(ids).await
    }

    pub async fn seed_defaults(&self) -> Result<Vec<AppointmentType>> {
        self.repo.seed_defaults().await
    }
}
