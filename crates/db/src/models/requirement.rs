use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Requirement {
    pub id: Uuid,
    pub onboarding_session_id: String,
    pub requirement_type: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub user_story: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateRequirement {
    pub requirement_type: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub user_story: Option<String>,
}

impl Requirement {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &CreateRequirement,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO requirements (id, onboarding_session_id, requirement_type, title, description, priority, user_story)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, onboarding_session_id, requirement_type, title, description, priority, user_story, created_at"#,
        )
        .bind(id)
        .bind(session_id)
        .bind(data.requirement_type.as_deref().unwrap_or(""))
        .bind(&data.title)
        .bind(data.description.as_deref().unwrap_or(""))
        .bind(data.priority.as_deref().unwrap_or(""))
        .bind(data.user_story.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, requirement_type, title, description, priority, user_story, created_at
               FROM requirements
               WHERE onboarding_session_id = $1
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }
}
