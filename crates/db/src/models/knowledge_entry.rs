use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Knowledge base entry. Generated feature documentation lands here with
/// source "ai"; nothing in the pipelines reads these back.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KnowledgeEntry {
    pub id: Uuid,
    pub onboarding_session_id: String,
    pub question: String,
    pub answer: String,
    pub source: String,
    pub is_important: bool,
    pub tags: String, // JSON-serialized Vec<String>
    pub created_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    pub fn parsed_tags(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateKnowledgeEntry {
    pub question: String,
    pub answer: String,
    pub source: String,
    pub is_important: bool,
    pub tags: Vec<String>,
}

impl KnowledgeEntry {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &CreateKnowledgeEntry,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let tags = serde_json::to_string(&data.tags)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO knowledge_entries (id, onboarding_session_id, question, answer, source, is_important, tags)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, onboarding_session_id, question, answer, source, is_important, tags, created_at"#,
        )
        .bind(id)
        .bind(session_id)
        .bind(&data.question)
        .bind(&data.answer)
        .bind(&data.source)
        .bind(data.is_important)
        .bind(tags)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, question, answer, source, is_important, tags, created_at
               FROM knowledge_entries
               WHERE onboarding_session_id = $1
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_session(pool: &SqlitePool, session_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM knowledge_entries WHERE onboarding_session_id = $1",
        )
        .bind(session_id)
        .fetch_one(pool)
        .await
    }
}
