use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow, QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::{
    domain::{Appointment, AppointmentFilter, AppointmentStatus, InspirationImage, NewAppointment},
    error::{AppError, Result},
    repository::AppointmentRepository,
};

#[derive(FromRow)]
struct AppointmentRow {
    id: String,
    user_id: String,
    appointment_type_id: String,
    scheduled_at: NaiveDateTime,
    status: String,
    full_name: String,
    phone: Option<String>,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct InspirationRow {
    file_name: String,
    path: String,
    content_type: Option<String>,
    size: i64,
}

const SELECT_APPOINTMENT: &str = r#"
    SELECT id, user_id, appointment_type_id, scheduled_at, status,
           full_name, phone, notes, created_at, updated_at
    FROM appointments
"#;

pub struct SqliteAppointmentRepository {
    pool: SqlitePool,
}

impl SqliteAppointmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_uuid(s: &str) -> Result<Uuid> {
        Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
    }

    fn row_to_appointment(row: AppointmentRow, inspirations: Vec<InspirationImage>) -> Result<Appointment> {
        Ok(Appointment {
            id: Self::parse_uuid(&row.id)?,
            user_id: Self::parse_uuid(&row.user_id)?,
            appointment_type_id: Self::parse_uuid(&row.appointment_type_id)?,
            scheduled_at: DateTime::from_naive_utc_and_offset(row.scheduled_at, Utc),
            status: AppointmentStatus::parse(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid appointment status: {}", row.status))
            })?,
            full_name: row.full_name,
            phone: row.phone,
            notes: row.notes,
            inspirations,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn load_inspirations(&self, appointment_id: &str) -> Result<Vec<InspirationImage>> {
        let rows = sqlx::query_as::<_, InspirationRow>(
            r#"
            SELECT file_name, path, content_type, size
            FROM appointment_inspirations
            WHERE appointment_id = ?
            ORDER BY sort_order ASC
            "#
        )
        .bind(appointment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| InspirationImage {
                file_name: r.file_name,
                path: r.path,
                content_type: r.content_type,
                size: r.size,
            })
            .collect())
    }

    async fn hydrate(&self, rows: Vec<AppointmentRow>) -> Result<Vec<Appointment>> {
        let mut appointments = Vec::with_capacity(rows.len());
        for row in rows {
            let inspirations = self.load_inspirations(&row.id).await?;
            appointments.push(Self::row_to_appointment(row, inspirations)?);
        }
        Ok(appointments)
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepository {
    async fn create_in_free_slot(
        &self,
        appointment: NewAppointment,
        hold_cutoff: DateTime<Utc>,
    ) -> Result<Appointment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let scheduled_at = appointment.scheduled_at.naive_utc();
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        let taken: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM appointments
            WHERE scheduled_at = ?
              AND (status IN ('SCHEDULED', 'COMPLETED')
                   OR (status = 'PENDING' AND updated_at > ?))
            "#
        )
        .bind(scheduled_at)
        .bind(hold_cutoff.naive_utc())
        .fetch_one(&mut *tx)
        .await?;

        if taken > 0 {
            return Err(AppError::Conflict("This time slot is already booked".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, user_id, appointment_type_id, scheduled_at, status,
                full_name, phone, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(appointment.user_id.to_string())
        .bind(appointment.appointment_type_id.to_string())
        .bind(scheduled_at)
        .bind(AppointmentStatus::Pending.as_str())
        .bind(&appointment.full_name)
        .bind(&appointment.phone)
        .bind(&appointment.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (index, image) in appointment.inspirations.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO appointment_inspirations (
                    id, appointment_id, file_name, path, content_type, size, sort_order
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id_str)
            .bind(&image.file_name)
            .bind(&image.path)
            .bind(&image.content_type)
            .bind(image.size)
            .bind(index as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created appointment".to_string())
        })
    }

    async fn refresh_hold(&self, id: Uuid, hold_cutoff: DateTime<Utc>) -> Result<Appointment> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        let scheduled_at: Option<NaiveDateTime> = sqlx::query_scalar(
            "SELECT scheduled_at FROM appointments WHERE id = ? AND status = ?"
        )
        .bind(&id_str)
        .bind(AppointmentStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(scheduled_at) = scheduled_at else {
            return Err(AppError::Conflict("Appointment is no longer awaiting payment".to_string()));
        };

        let taken: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM appointments
            WHERE scheduled_at = ? AND id <> ?
              AND (status IN ('SCHEDULED', 'COMPLETED')
                   OR (status = 'PENDING' AND updated_at > ?))
            "#
        )
        .bind(scheduled_at)
        .bind(&id_str)
        .bind(hold_cutoff.naive_utc())
        .fetch_one(&mut *tx)
        .await?;

        if taken > 0 {
            return Err(AppError::Conflict("This time slot has been taken by another booking".to_string()));
        }

        sqlx::query("UPDATE appointments SET updated_at = ? WHERE id = ?")
            .bind(Utc::now().naive_utc())
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve appointment".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, AppointmentRow>(
            &format!("{} WHERE id = ?", SELECT_APPOINTMENT)
        )
        .bind(&id_str)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let inspirations = self.load_inspirations(&id_str).await?;
                Ok(Some(Self::row_to_appointment(r, inspirations)?))
            }
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            &format!("{} WHERE user_id = ? ORDER BY scheduled_at DESC", SELECT_APPOINTMENT)
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn list(&self, filter: AppointmentFilter, limit: i64, offset: i64) -> Result<Vec<Appointment>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_APPOINTMENT);
        query.push(" WHERE 1 = 1");

        if let Some(from) = filter.from {
            query.push(" AND scheduled_at >= ").push_bind(from.naive_utc());
        }
        if let Some(to) = filter.to {
            query.push(" AND scheduled_at < ").push_bind(to.naive_utc());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }

        query
            .push(" ORDER BY scheduled_at ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = query
            .build_query_as::<AppointmentRow>()
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    async fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            &format!(
                "{} WHERE scheduled_at >= ? AND scheduled_at < ? ORDER BY scheduled_at ASC",
                SELECT_APPOINTMENT
            )
        )
        .bind(from.naive_utc())
        .bind(to.naive_utc())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<Appointment> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            "UPDATE appointments SET status = ?, updated_at = ? WHERE id = ?"
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") {
                AppError::Conflict("Another booking already holds this time slot".to_string())
            } else {
                AppError::Database(msg)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Appointment not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated appointment".to_string())
        })
    }

    async fn count_by_type(&self, appointment_type_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM appointments WHERE appointment_type_id = ?"
        )
        .bind(appointment_type_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
