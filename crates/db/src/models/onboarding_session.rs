use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// An onboarding session owned by the surrounding platform. Sessions are
/// created and driven outside the generation pipelines; here they are the
/// scoping key for everything else.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OnboardingSession {
    pub id: String,
    pub tenant_id: String,
    pub high_level_summary: String,
    pub single_source_of_truth: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOnboardingSession {
    /// Platform-assigned id. A fresh uuid is used when omitted.
    pub id: Option<String>,
    pub tenant_id: String,
    pub high_level_summary: Option<String>,
    pub single_source_of_truth: Option<String>,
    pub status: Option<String>,
}

impl OnboardingSession {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateOnboardingSession,
    ) -> Result<Self, sqlx::Error> {
        let id = data
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO onboarding_sessions (id, tenant_id, high_level_summary, single_source_of_truth, status)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, tenant_id, high_level_summary, single_source_of_truth, status, created_at, updated_at"#,
        )
        .bind(&id)
        .bind(&data.tenant_id)
        .bind(data.high_level_summary.as_deref().unwrap_or(""))
        .bind(data.single_source_of_truth.as_deref().unwrap_or(""))
        .bind(data.status.as_deref().unwrap_or("active"))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, tenant_id, high_level_summary, single_source_of_truth, status, created_at, updated_at
               FROM onboarding_sessions
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn create_and_find_round_trip() {
        let db = DBService::new_in_memory().await.unwrap();
        let created = OnboardingSession::create(
            &db.pool,
            &CreateOnboardingSession {
                id: Some("s1".to_string()),
                tenant_id: "t1".to_string(),
                high_level_summary: Some("field service app".to_string()),
                single_source_of_truth: None,
                status: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(created.id, "s1");
        assert_eq!(created.status, "active");
        assert_eq!(created.single_source_of_truth, "");

        let found = OnboardingSession::find_by_id(&db.pool, "s1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.tenant_id, "t1");

        assert!(
            OnboardingSession::find_by_id(&db.pool, "missing")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn generates_an_id_when_absent() {
        let db = DBService::new_in_memory().await.unwrap();
        let created = OnboardingSession::create(
            &db.pool,
            &CreateOnboardingSession {
                id: None,
                tenant_id: "t1".to_string(),
                high_level_summary: None,
                single_source_of_truth: None,
                status: None,
            },
        )
        .await
        .unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());
    }
}
