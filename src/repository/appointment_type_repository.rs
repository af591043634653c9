use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        AppointmentType, CreateAppointmentTypeRequest, UpdateAppointmentTypeRequest,
        default_appointment_types, slugify,
    },
    error::{AppError, Result},
    repository::AppointmentTypeRepository,
};

#[derive(FromRow)]
struct AppointmentTypeRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    price_cents: i64,
    duration_minutes: i32,
    sort_order: i32,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteAppointmentTypeRepository {
    pool: SqlitePool,
}

impl SqliteAppointmentTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_type(row: AppointmentTypeRow) -> Result<AppointmentType> {
        Ok(AppointmentType {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price_cents: row.price_cents,
            duration_minutes: row.duration_minutes,
            sort_order: row.sort_order,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn next_sort_order(&self) -> Result<i32> {
        let row: (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(sort_order) FROM appointment_types"
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.0.map(|n| n + 1).unwrap_or(0))
    }

    async fn insert(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
        price_cents: i64,
        duration_minutes: i32,
        sort_order: i32,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO appointment_types (
                id, name, slug, description, price_cents, duration_minutes,
                sort_order, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(price_cents)
        .bind(duration_minutes)
        .bind(sort_order)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(id)
    }
}

#[async_trait]
impl AppointmentTypeRepository for SqliteAppointmentTypeRepository {
    async fn create(&self, request: CreateAppointmentTypeRequest) -> Result<AppointmentType> {
        let slug = request.slug.unwrap_or_else(|| slugify(&request.name));
        let sort_order = self.next_sort_order().await?;

        let id = self
            .insert(
                &request.name,
                &slug,
                request.description.as_deref(),
                request.price_cents,
                request.duration_minutes,
                sort_order,
            )
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created appointment type".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AppointmentType>> {
        let row = sqlx::query_as::<_, AppointmentTypeRow>(
            r#"
            SELECT id, name, slug, description, price_cents, duration_minutes,
                   sort_order, is_active, created_at, updated_at
            FROM appointment_types
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_type).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<AppointmentType>> {
        let row = sqlx::query_as::<_, AppointmentTypeRow>(
            r#"
            SELECT id, name, slug, description, price_cents, duration_minutes,
                   sort_order, is_active, created_at, updated_at
            FROM appointment_types
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_type).transpose()
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<AppointmentType>> {
        let query = if include_inactive {
            r#"
            SELECT id, name, slug, description, price_cents, duration_minutes,
                   sort_order, is_active, created_at, updated_at
            FROM appointment_types
            ORDER BY sort_order ASC, name ASC
            "#
        } else {
            r#"
            SELECT id, name, slug, description, price_cents, duration_minutes,
                   sort_order, is_active, created_at, updated_at
            FROM appointment_types
            WHERE is_active = 1
            ORDER BY sort_order ASC, name ASC
            "#
        };

        let rows = sqlx::query_as::<_, AppointmentTypeRow>(query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_type).collect()
    }

    async fn update(&self, id: Uuid, request: UpdateAppointmentTypeRequest) -> Result<AppointmentType> {
        let existing = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Appointment type not found".to_string())
        })?;

        let now = Utc::now().naive_utc();

        let name = request.name.unwrap_or(existing.name);
        let description = request.description.or(existing.description);
        let price_cents = request.price_cents.unwrap_or(existing.price_cents);
        let duration_minutes = request.duration_minutes.unwrap_or(existing.duration_minutes);
        let sort_order = request.sort_order.unwrap_or(existing.sort_order);
        let is_active = request.is_active.unwrap_or(existing.is_active);

        sqlx::query(
            r#"
            UPDATE appointment_types
            SET name = ?, description = ?, price_cents = ?, duration_minutes = ?,
                sort_order = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(&description)
        .bind(price_cents)
        .bind(duration_minutes)
        .bind(sort_order)
        .bind(if is_active { 1i32 } else { 0i32 })
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated appointment type".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM appointment_types WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn reorder(&self, ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (index, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE appointment_types SET sort_order = ? WHERE id = ?")
                .bind(index as i32)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn seed_defaults(&self) -> Result<Vec<AppointmentType>> {
        let mut created = Vec::new();

        for (index, (name, slug, price_cents, duration)) in default_appointment_types().into_iter().enumerate() {
            // Skip if already exists
            if self.find_by_slug(slug).await?.is_some() {
                continue;
            }

            let id = self
                .insert(name, slug, None, price_cents, duration, index as i32)
                .await?;

            if let Some(appointment_type) = self.find_by_id(id).await? {
                created.push(appointment_type);
            }
        }

        Ok(created)
    }
}
