use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A single field of a proposed entity, as the model describes it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntityField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntityRelationship {
    pub target_entity: String,
    pub relationship_type: String,
    #[serde(default)]
    pub foreign_key: Option<String>,
}

/// One LLM-proposed entity. Immutable once created; re-running generation
/// for a session appends a new set rather than replacing this one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntitySchema {
    pub id: Uuid,
    pub onboarding_session_id: String,
    pub entity_name: String,
    pub description: String,
    pub fields: String,        // JSON-serialized Vec<EntityField>
    pub relationships: String, // JSON-serialized Vec<EntityRelationship>
    pub priority: i64,
    pub created_at: DateTime<Utc>,
}

impl EntitySchema {
    pub fn parsed_fields(&self) -> Result<Vec<EntityField>, serde_json::Error> {
        serde_json::from_str(&self.fields)
    }

    pub fn parsed_relationships(&self) -> Result<Vec<EntityRelationship>, serde_json::Error> {
        serde_json::from_str(&self.relationships)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateEntitySchema {
    pub entity_name: String,
    pub description: String,
    pub fields: Vec<EntityField>,
    pub relationships: Vec<EntityRelationship>,
    pub priority: i64,
}

impl EntitySchema {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &CreateEntitySchema,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let fields = serde_json::to_string(&data.fields)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        let relationships = serde_json::to_string(&data.relationships)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO entity_schemas (id, onboarding_session_id, entity_name, description, fields, relationships, priority)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, onboarding_session_id, entity_name, description, fields, relationships, priority, created_at"#,
        )
        .bind(id)
        .bind(session_id)
        .bind(&data.entity_name)
        .bind(&data.description)
        .bind(fields)
        .bind(relationships)
        .bind(data.priority)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, entity_name, description, fields, relationships, priority, created_at
               FROM entity_schemas
               WHERE onboarding_session_id = $1
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_session(pool: &SqlitePool, session_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM entity_schemas WHERE onboarding_session_id = $1",
        )
        .bind(session_id)
        .fetch_one(pool)
        .await
    }
}
