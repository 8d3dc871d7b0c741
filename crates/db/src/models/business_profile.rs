use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessProfile {
    pub id: Uuid,
    pub onboarding_session_id: String,
    pub business_name: String,
    pub industry: String,
    pub business_model: String,
    pub target_market: String,
    pub key_offerings: Option<String>, // JSON-serialized Vec<String>
    pub created_at: DateTime<Utc>,
}

impl BusinessProfile {
    pub fn parsed_key_offerings(&self) -> Vec<String> {
        self.key_offerings
            .as_ref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateBusinessProfile {
    pub business_name: Option<String>,
    pub industry: Option<String>,
    pub business_model: Option<String>,
    pub target_market: Option<String>,
    pub key_offerings: Option<Vec<String>>,
}

impl BusinessProfile {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &CreateBusinessProfile,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let key_offerings = data
            .key_offerings
            .as_ref()
            .map(|v| serde_json::to_string(v).map_err(|e| sqlx::Error::Protocol(e.to_string())))
            .transpose()?;
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO business_profiles (id, onboarding_session_id, business_name, industry, business_model, target_market, key_offerings)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, onboarding_session_id, business_name, industry, business_model, target_market, key_offerings, created_at"#,
        )
        .bind(id)
        .bind(session_id)
        .bind(data.business_name.as_deref().unwrap_or(""))
        .bind(data.industry.as_deref().unwrap_or(""))
        .bind(data.business_model.as_deref().unwrap_or(""))
        .bind(data.target_market.as_deref().unwrap_or(""))
        .bind(key_offerings)
        .fetch_one(pool)
        .await
    }

    /// The most recent profile for a session, if one was captured.
    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, business_name, industry, business_model, target_market, key_offerings, created_at
               FROM business_profiles
               WHERE onboarding_session_id = $1
               ORDER BY created_at DESC, rowid DESC
               LIMIT 1"#,
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await
    }
}
