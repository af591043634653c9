use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreateReminderRequest, Reminder, UpdateReminderRequest},
    error::{AppError, Result},
    repository::ReminderRepository,
};

#[derive(FromRow)]
struct ReminderRow {
    id: String,
    title: String,
    body: String,
    sort_order: i32,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteReminderRepository {
    pool: SqlitePool,
}

impl SqliteReminderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_reminder(row: ReminderRow) -> Result<Reminder> {
        Ok(Reminder {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            body: row.body,
            sort_order: row.sort_order,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl ReminderRepository for SqliteReminderRepository {
    async fn create(&self, request: CreateReminderRequest) -> Result<Reminder> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO reminders (id, title, body, sort_order, is_active, created_at, updated_at)
            VALUES (?, ?, ?, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM reminders), 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&request.title)
        .bind(&request.body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created reminder".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reminder>> {
        let row = sqlx::query_as::<_, ReminderRow>(
            r#"
            SELECT id, title, body, sort_order, is_active, created_at, updated_at
            FROM reminders
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_reminder).transpose()
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            r#"
            SELECT id, title, body, sort_order, is_active, created_at, updated_at
            FROM reminders
            WHERE is_active = 1 OR ?
            ORDER BY sort_order ASC, created_at ASC
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_reminder).collect()
    }

    async fn update(&self, id: Uuid, request: UpdateReminderRequest) -> Result<Reminder> {
        let existing = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Reminder not found".to_string())
        })?;

        let now = Utc::now().naive_utc();
        let is_active = request.is_active.unwrap_or(existing.is_active);

        sqlx::query(
            r#"
            UPDATE reminders
            SET title = ?, body = ?, sort_order = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.title.unwrap_or(existing.title))
        .bind(request.body.unwrap_or(existing.body))
        .bind(request.sort_order.unwrap_or(existing.sort_order))
        .bind(if is_active { 1i32 } else { 0i32 })
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated reminder".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Reminder not found".to_string()));
        }

        Ok(())
    }

    async fn reorder(&self, ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (index, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE reminders SET sort_order = ? WHERE id = ?")
                .bind(index as i32)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
