use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageDataSource {
    pub entity: String,
    #[serde(default)]
    pub filters: Option<serde_json::Value>,
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageAction {
    pub name: String,
    #[serde(rename = "type", default)]
    pub action_type: String,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageSchema {
    pub id: Uuid,
    pub onboarding_session_id: String,
    pub page_name: String,
    pub page_type: String,
    pub description: String,
    /// Name of the entity the page is built around. Not validated against
    /// entity_schemas; the generator may reference entities it never
    /// proposed.
    pub primary_entity: String,
    pub data_sources: String, // JSON-serialized Vec<PageDataSource>
    pub actions: String,      // JSON-serialized Vec<PageAction>
    pub priority: i64,
    pub created_at: DateTime<Utc>,
}

impl PageSchema {
    pub fn parsed_data_sources(&self) -> Result<Vec<PageDataSource>, serde_json::Error> {
        serde_json::from_str(&self.data_sources)
    }

    pub fn parsed_actions(&self) -> Result<Vec<PageAction>, serde_json::Error> {
        serde_json::from_str(&self.actions)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreatePageSchema {
    pub page_name: String,
    pub page_type: String,
    pub description: String,
    pub primary_entity: String,
    pub data_sources: Vec<PageDataSource>,
    pub actions: Vec<PageAction>,
    pub priority: i64,
}

impl PageSchema {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &CreatePageSchema,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let data_sources = serde_json::to_string(&data.data_sources)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        let actions = serde_json::to_string(&data.actions)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO page_schemas (id, onboarding_session_id, page_name, page_type, description, primary_entity, data_sources, actions, priority)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING id, onboarding_session_id, page_name, page_type, description, primary_entity, data_sources, actions, priority, created_at"#,
        )
        .bind(id)
        .bind(session_id)
        .bind(&data.page_name)
        .bind(&data.page_type)
        .bind(&data.description)
        .bind(&data.primary_entity)
        .bind(data_sources)
        .bind(actions)
        .bind(data.priority)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, page_name, page_type, description, primary_entity, data_sources, actions, priority, created_at
               FROM page_schemas
               WHERE onboarding_session_id = $1
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }
}
