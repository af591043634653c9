use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreateFaqRequest, Faq, UpdateFaqRequest},
    error::{AppError, Result},
    repository::FaqRepository,
};

#[derive(FromRow)]
struct FaqRow {
    id: String,
    question: String,
    answer: String,
    sort_order: i32,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteFaqRepository {
    pool: SqlitePool,
}

impl SqliteFaqRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_faq(row: FaqRow) -> Result<Faq> {
        Ok(Faq {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            question: row.question,
            answer: row.answer,
            sort_order: row.sort_order,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl FaqRepository for SqliteFaqRepository {
    async fn create(&self, request: CreateFaqRequest) -> Result<Faq> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO faqs (id, question, answer, sort_order, is_active, created_at, updated_at)
            VALUES (?, ?, ?, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM faqs), 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&request.question)
        .bind(&request.answer)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created FAQ".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Faq>> {
        let row = sqlx::query_as::<_, FaqRow>(
            r#"
            SELECT id, question, answer, sort_order, is_active, created_at, updated_at
            FROM faqs
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_faq).transpose()
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Faq>> {
        let rows = sqlx::query_as::<_, FaqRow>(
            r#"
            SELECT id, question, answer, sort_order, is_active, created_at, updated_at
            FROM faqs
            WHERE is_active = 1 OR ?
            ORDER BY sort_order ASC, created_at ASC
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_faq).collect()
    }

    async fn update(&self, id: Uuid, request: UpdateFaqRequest) -> Result<Faq> {
        let existing = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("FAQ not found".to_string())
        })?;

        let now = Utc::now().naive_utc();
        let is_active = request.is_active.unwrap_or(existing.is_active);

        sqlx::query(
            r#"
            UPDATE faqs
            SET question = ?, answer = ?, sort_order = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.question.unwrap_or(existing.question))
        .bind(request.answer.unwrap_or(existing.answer))
        .bind(request.sort_order.unwrap_or(existing.sort_order))
        .bind(if is_active { 1i32 } else { 0i32 })
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated FAQ".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("FAQ not found".to_string()));
        }

        Ok(())
    }

    async fn reorder(&self, ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (index, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE faqs SET sort_order = ? WHERE id = ?")
                .bind(index as i32)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
