use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserStory {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub want: String,
    #[serde(default)]
    pub so_that: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WorkflowStep {
    #[serde(default)]
    pub step: i64,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default)]
    pub result: String,
}

/// Feature priority is a label ("must_have", "should_have", ...), unlike
/// the numeric ranks on entities, pages and integrations.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeatureSchema {
    pub id: Uuid,
    pub onboarding_session_id: String,
    pub feature_name: String,
    pub description: String,
    pub user_stories: String,      // JSON-serialized Vec<UserStory>
    pub workflow: String,          // JSON-serialized Vec<WorkflowStep>
    pub entities_involved: String, // JSON-serialized Vec<String>
    pub pages_involved: String,    // JSON-serialized Vec<String>
    pub business_rules: String,    // JSON-serialized Vec<String>
    pub priority: String,
    pub created_at: DateTime<Utc>,
}

impl FeatureSchema {
    pub fn parsed_user_stories(&self) -> Result<Vec<UserStory>, serde_json::Error> {
        serde_json::from_str(&self.user_stories)
    }

    pub fn parsed_workflow(&self) -> Result<Vec<WorkflowStep>, serde_json::Error> {
        serde_json::from_str(&self.workflow)
    }

    pub fn parsed_entities_involved(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.entities_involved)
    }

    pub fn parsed_business_rules(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.business_rules)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateFeatureSchema {
    pub feature_name: String,
    pub description: String,
    pub user_stories: Vec<UserStory>,
    pub workflow: Vec<WorkflowStep>,
    pub entities_involved: Vec<String>,
    pub pages_involved: Vec<String>,
    pub business_rules: Vec<String>,
    pub priority: String,
}

impl FeatureSchema {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &CreateFeatureSchema,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let user_stories = encode(&data.user_stories)?;
        let workflow = encode(&data.workflow)?;
        let entities_involved = encode(&data.entities_involved)?;
        let pages_involved = encode(&data.pages_involved)?;
        let business_rules = encode(&data.business_rules)?;
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO feature_schemas (id, onboarding_session_id, feature_name, description, user_stories, workflow, entities_involved, pages_involved, business_rules, priority)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING id, onboarding_session_id, feature_name, description, user_stories, workflow, entities_involved, pages_involved, business_rules, priority, created_at"#,
        )
        .bind(id)
        .bind(session_id)
        .bind(&data.feature_name)
        .bind(&data.description)
        .bind(user_stories)
        .bind(workflow)
        .bind(entities_involved)
        .bind(pages_involved)
        .bind(business_rules)
        .bind(&data.priority)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, feature_name, description, user_stories, workflow, entities_involved, pages_involved, business_rules, priority, created_at
               FROM feature_schemas
               WHERE onboarding_session_id = $1
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(value).map_err(|e| sqlx::Error::Protocol(e.to_string()))
}
