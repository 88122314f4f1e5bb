// src/storage/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};

use crate::{
    error::StoreError,
    models::{
        lab_result::LabResult,
        quiz::{AnsweredQuestion, QuizState, StateUpdate},
    },
    storage::StateStore,
};

/// `StateStore` backed by PostgreSQL.
///
/// Conditional inserts (`ON CONFLICT DO NOTHING`) provide the per-user
/// first-writer-wins guarantees; no explicit transactions are needed.
#[derive(Clone)]
pub struct PgStateStore {
    pool: PgPool,
}

impl PgStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_answers(&self, user_id: &str) -> Result<Vec<AnsweredQuestion>, StoreError> {
        let answers = sqlx::query_as::<_, AnsweredQuestion>(
            r#"
            SELECT question_key, prompt, submitted_answer, correct_answer, points
            FROM answered_questions
            WHERE user_id = $1
            ORDER BY seq
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }
}

#[async_trait]
impl StateStore for PgStateStore {
    async fn get_assignment(&self, user_id: &str) -> Result<Option<Vec<String>>, StoreError> {
        let row: Option<(Json<Vec<String>>,)> =
            sqlx::query_as("SELECT question_keys FROM quiz_assignments WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(keys,)| keys.0))
    }

    async fn create_assignment_if_absent(
        &self,
        user_id: &str,
        keys: &[String],
    ) -> Result<Vec<String>, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO quiz_assignments (user_id, question_keys)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(Json(keys))
        .execute(&self.pool)
        .await?;

        // Read back: a concurrent request may have committed first.
        self.get_assignment(user_id).await?.ok_or_else(|| {
            StoreError::Corrupt(format!("assignment for '{}' vanished after insert", user_id))
        })
    }

    async fn get_state(&self, user_id: &str) -> Result<Option<QuizState>, StoreError> {
        let answered = self.fetch_answers(user_id).await?;
        if answered.is_empty() {
            return Ok(None);
        }
        Ok(Some(QuizState { answered }))
    }

    async fn upsert_state(
        &self,
        user_id: &str,
        answer: AnsweredQuestion,
    ) -> Result<StateUpdate, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO answered_questions
                (user_id, question_key, prompt, submitted_answer, correct_answer, points)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, question_key) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&answer.question_key)
        .bind(&answer.prompt)
        .bind(&answer.submitted_answer)
        .bind(&answer.correct_answer)
        .bind(answer.points)
        .execute(&self.pool)
        .await?;

        let answered = self.fetch_answers(user_id).await?;

        Ok(StateUpdate {
            inserted: result.rows_affected() == 1,
            state: QuizState { answered },
        })
    }

    async fn upsert_lab_result(&self, result: &LabResult) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO lab_results
                (user_id, points, optimal_binder_content, max_bulk_density, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                points = EXCLUDED.points,
                optimal_binder_content = EXCLUDED.optimal_binder_content,
                max_bulk_density = EXCLUDED.max_bulk_density,
                recorded_at = EXCLUDED.recorded_at
            "#,
        )
        .bind(&result.user_id)
        .bind(result.points)
        .bind(result.optimal_binder_content)
        .bind(result.max_bulk_density)
        .bind(result.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_lab_result(&self, user_id: &str) -> Result<Option<LabResult>, StoreError> {
        let result = sqlx::query_as::<_, LabResult>(
            r#"
            SELECT user_id, points, optimal_binder_content, max_bulk_density, recorded_at
            FROM lab_results
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn insert_export_row_if_absent(&self, row: &LabResult) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO export_rows
                (user_id, points, optimal_binder_content, max_bulk_density, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(&row.user_id)
        .bind(row.points)
        .bind(row.optimal_binder_content)
        .bind(row.max_bulk_density)
        .bind(row.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_export_rows(&self) -> Result<Vec<LabResult>, StoreError> {
        let rows = sqlx::query_as::<_, LabResult>(
            r#"
            SELECT user_id, points, optimal_binder_content, max_bulk_density, recorded_at
            FROM export_rows
            ORDER BY recorded_at, user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
