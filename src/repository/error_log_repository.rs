use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{ErrorContext, ErrorLog},
    error::{AppError, Result},
    repository::ErrorLogRepository,
};

#[derive(FromRow)]
struct ErrorLogRow {
    id: String,
    message: String,
    url: String,
    function_name: String,
    user_email: Option<String>,
    user_id: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteErrorLogRepository {
    pool: SqlitePool,
}

impl SqliteErrorLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_log(row: ErrorLogRow) -> Result<ErrorLog> {
        Ok(ErrorLog {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            message: row.message,
            url: row.url,
            function_name: row.function_name,
            user_email: row.user_email,
            user_id: row.user_id.and_then(|s| Uuid::parse_str(&s).ok()),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl ErrorLogRepository for SqliteErrorLogRepository {
    async fn record(&self, message: &str, context: &ErrorContext) -> Result<()> {
        tracing::error!(
            url = %context.url,
            function = %context.function_name,
            user_id = ?context.user_id,
            user_email = ?context.user_email,
            "{}",
            message
        );

        sqlx::query(
            r#"
            INSERT INTO error_logs (id, message, url, function_name, user_email, user_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(message)
        .bind(&context.url)
        .bind(&context.function_name)
        .bind(&context.user_email)
        .bind(context.user_id.map(|id| id.to_string()))
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ErrorLog>> {
        let rows = sqlx::query_as::<_, ErrorLogRow>(
            r#"
            SELECT id, message, url, function_name, user_email, user_id, created_at
            FROM error_logs
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_log).collect()
    }
}
