use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreateScheduleSlotRequest, ScheduleSlot, UpdateScheduleSlotRequest},
    error::{AppError, Result},
    repository::ScheduleSlotRepository,
};

const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(FromRow)]
struct ScheduleSlotRow {
    id: String,
    weekday: i64,
    start_time: String,
    end_time: String,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteScheduleSlotRepository {
    pool: SqlitePool,
}

impl SqliteScheduleSlotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_time(s: &str) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(s, TIME_FORMAT)
            .map_err(|e| AppError::Database(format!("Invalid slot time {}: {}", s, e)))
    }

    fn row_to_slot(row: ScheduleSlotRow) -> Result<ScheduleSlot> {
        Ok(ScheduleSlot {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            weekday: u8::try_from(row.weekday)
                .map_err(|_| AppError::Database(format!("Invalid weekday: {}", row.weekday)))?,
            start_time: Self::parse_time(&row.start_time)?,
            end_time: Self::parse_time(&row.end_time)?,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    /// Unique index violations mean another active slot already starts then.
    fn map_write_error(e: sqlx::Error) -> AppError {
        let msg = e.to_string();
        if msg.contains("UNIQUE") {
            AppError::Conflict("An active slot already starts at that time on that day".to_string())
        } else {
            AppError::Database(msg)
        }
    }
}

#[async_trait]
impl ScheduleSlotRepository for SqliteScheduleSlotRepository {
    async fn create(&self, request: CreateScheduleSlotRequest) -> Result<ScheduleSlot> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO schedule_slots (id, weekday, start_time, end_time, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(request.weekday as i64)
        .bind(request.start_time.format(TIME_FORMAT).to_string())
        .bind(request.end_time.format(TIME_FORMAT).to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created slot".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduleSlot>> {
        let row = sqlx::query_as::<_, ScheduleSlotRow>(
            r#"
            SELECT id, weekday, start_time, end_time, is_active, created_at, updated_at
            FROM schedule_slots
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_slot).transpose()
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<ScheduleSlot>> {
        let rows = sqlx::query_as::<_, ScheduleSlotRow>(
            r#"
            SELECT id, weekday, start_time, end_time, is_active, created_at, updated_at
            FROM schedule_slots
            WHERE is_active = 1 OR ?
            ORDER BY weekday ASC, start_time ASC
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_slot).collect()
    }

    async fn update(&self, id: Uuid, request: UpdateScheduleSlotRequest) -> Result<ScheduleSlot> {
        let existing = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Schedule slot not found".to_string())
        })?;

        let now = Utc::now().naive_utc();
        let weekday = request.weekday.unwrap_or(existing.weekday);
        let start_time = request.start_time.unwrap_or(existing.start_time);
        let end_time = request.end_time.unwrap_or(existing.end_time);
        let is_active = request.is_active.unwrap_or(existing.is_active);

        sqlx::query(
            r#"
            UPDATE schedule_slots
            SET weekday = ?, start_time = ?, end_time = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(weekday as i64)
        .bind(start_time.format(TIME_FORMAT).to_string())
        .bind(end_time.format(TIME_FORMAT).to_string())
        .bind(if is_active { 1i32 } else { 0i32 })
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Self::map_write_error)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated slot".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM schedule_slots WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Schedule slot not found".to_string()));
        }

        Ok(())
    }
}
