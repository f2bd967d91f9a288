//! `PostgreSQL` [`Repository`] via `sqlx`.
//!
//! An answer and its elements are written in one transaction. Elements carry
//! their list position so the original order survives a round trip; deleting
//! an answer cascades to its elements.

use answer_core::{Answer, Repository};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use uuid::Uuid;

const CREATE_ANSWERS: &str = r"
    CREATE TABLE IF NOT EXISTS answers (
        id          UUID PRIMARY KEY,
        form_id     UUID NOT NULL,
        user_id     UUID NOT NULL,
        is_complete BOOLEAN NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
";

const CREATE_ELEMENTS: &str = r"
    CREATE TABLE IF NOT EXISTS answer_elements (
        answer_id             UUID NOT NULL REFERENCES answers(id) ON UPDATE CASCADE ON DELETE CASCADE,
        position              INTEGER NOT NULL,
        question_order_number BIGINT NOT NULL,
        content               TEXT NOT NULL,
        PRIMARY KEY (answer_id, position)
    )
";

const CREATE_ELEMENTS_INDEX: &str = r"
    CREATE INDEX IF NOT EXISTS answer_elements_question_order
        ON answer_elements (answer_id, question_order_number)
";

pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Opens a pool against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be established.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Creates the tables if they do not exist. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails.
    pub async fn initialize(&self) -> anyhow::Result<()> {
        for statement in [CREATE_ANSWERS, CREATE_ELEMENTS, CREATE_ELEMENTS_INDEX] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("answer tables ready");
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_answer(&self, answer: &Answer) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO answers (id, form_id, user_id, is_complete) VALUES ($1, $2, $3, $4)",
        )
        .bind(answer.id)
        .bind(answer.form_id)
        .bind(answer.user_id)
        .bind(answer.is_complete)
        .execute(&mut *tx)
        .await?;

        for (position, element) in answer.elements.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO answer_elements (answer_id, position, question_order_number, content)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(answer.id)
            .bind(i32::try_from(position)?)
            .bind(i64::from(element.question_order_number))
            .bind(&element.content)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_answer(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM answers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl answer_core::Closer for PostgresRepository {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
