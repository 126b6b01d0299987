use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Instant;

use crate::errors::PipelineError;
use crate::log_db_operation;
use crate::models::*;

/// SQLite-backed quiz history. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct QuizStore {
    pool: SqlitePool,
}

impl QuizStore {
    pub async fn new(database_url: &str) -> Result<Self, PipelineError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Each connection to an in-memory database is its own database, so keep exactly one
        // and never recycle it.
        let pool = if database_url.contains(":memory:") || database_url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        let store = QuizStore { pool };
        store.migrate().await?;
        log_db_operation!(info, "migrate", "quiz schema ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                date_generated TEXT NOT NULL,
                scraped_content TEXT,
                full_quiz_data TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persist a generated quiz and return its new id
    pub async fn save(
        &self,
        url: &str,
        title: &str,
        scraped_content: Option<&str>,
        quiz: &GeneratedQuiz,
    ) -> Result<i64, PipelineError> {
        let started = Instant::now();
        let quiz_json = serde_json::to_string(quiz)
            .map_err(|e| PipelineError::Generation(format!("quiz could not be serialized: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO quizzes (url, title, date_generated, scraped_content, full_quiz_data)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(url)
        .bind(title)
        .bind(Utc::now().to_rfc3339())
        .bind(scraped_content)
        .bind(&quiz_json)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        log_db_operation!(
            debug,
            "save_quiz",
            quiz_id = id,
            duration_ms = started.elapsed().as_millis() as u64
        );
        Ok(id)
    }

    /// History entries in insertion order
    pub async fn list(&self) -> Result<Vec<QuizHistoryEntry>, PipelineError> {
        let started = Instant::now();
        let rows = sqlx::query("SELECT id, url, title, date_generated FROM quizzes ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(QuizHistoryEntry {
                id: row.get("id"),
                url: row.get("url"),
                title: row.get("title"),
                date_generated: parse_timestamp(&row)?,
            });
        }

        log_db_operation!(
            debug,
            "list_quizzes",
            count = entries.len(),
            duration_ms = started.elapsed().as_millis() as u64
        );
        Ok(entries)
    }

    pub async fn get_record(&self, id: i64) -> Result<StoredQuizRecord, PipelineError> {
        let row = sqlx::query("SELECT * FROM quizzes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PipelineError::NotFound(id))?;

        Ok(StoredQuizRecord {
            id: row.get("id"),
            url: row.get("url"),
            title: row.get("title"),
            date_generated: parse_timestamp(&row)?,
            scraped_content: row.get("scraped_content"),
            full_quiz_json: row.get("full_quiz_data"),
        })
    }

    pub async fn get(&self, id: i64) -> Result<Quiz, PipelineError> {
        let record = self.get_record(id).await?;
        let content: GeneratedQuiz = serde_json::from_str(&record.full_quiz_json)
            .map_err(|source| {
                log_db_operation!(error, "get_quiz", error = source);
                PipelineError::CorruptRecord { id, source }
            })?;

        Ok(Quiz { id, content })
    }

    pub async fn delete(&self, id: i64) -> Result<(), PipelineError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PipelineError::NotFound(id));
        }

        log_db_operation!(info, "delete_quiz", format!("deleted quiz {}", id));
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, PipelineError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn parse_timestamp(row: &SqliteRow) -> Result<DateTime<Utc>, PipelineError> {
    let raw: String = row.get("date_generated");
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PipelineError::Database(sqlx::Error::Decode(Box::new(e))))
}
