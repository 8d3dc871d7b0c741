use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Lifecycle of a build attempt. Every record is created `building` and is
/// updated exactly once to one of the terminal states.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BuildStatus {
    #[default]
    Building,
    Success,
    Partial,
    Failed,
}

/// One failed item from a build pass.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BuildItemError {
    #[serde(rename = "type")]
    pub item_type: String,
    pub name: String,
    pub error: String,
}

/// Per-category outcome of a build, persisted on the version record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BuildResults {
    pub entities: Vec<String>,
    pub pages: Vec<String>,
    pub features: Vec<String>,
    pub integrations: Vec<String>,
    pub errors: Vec<BuildItemError>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppBuildVersion {
    pub id: Uuid,
    pub onboarding_session_id: String,
    pub build_number: String,
    pub build_options: String, // JSON-serialized build toggles
    pub status: BuildStatus,
    pub build_results: Option<String>, // JSON-serialized BuildResults
    pub build_duration_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppBuildVersion {
    pub fn parsed_results(&self) -> Option<BuildResults> {
        self.build_results
            .as_ref()
            .and_then(|json| serde_json::from_str(json).ok())
    }

    /// Insert a new `building` record. The build number is derived inside
    /// the INSERT so concurrent builds for one session cannot claim the
    /// same number.
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        build_options: &str,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO app_build_versions (id, onboarding_session_id, build_number, build_options, status)
               SELECT $1, $2, printf('build-%03d', COUNT(*) + 1), $3, 'building'
               FROM app_build_versions
               WHERE onboarding_session_id = $2
               RETURNING id, onboarding_session_id, build_number, build_options, status, build_results, build_duration_ms, created_at, updated_at"#,
        )
        .bind(id)
        .bind(session_id)
        .bind(build_options)
        .fetch_one(pool)
        .await
    }

    /// The single terminal update of a build record.
    pub async fn finish(
        pool: &SqlitePool,
        id: Uuid,
        status: BuildStatus,
        build_results: &str,
        build_duration_ms: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"UPDATE app_build_versions
               SET status = $2,
                   build_results = $3,
                   build_duration_ms = $4,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING id, onboarding_session_id, build_number, build_options, status, build_results, build_duration_ms, created_at, updated_at"#,
        )
        .bind(id)
        .bind(status)
        .bind(build_results)
        .bind(build_duration_ms)
        .fetch_one(pool)
        .await
    }

    /// Best-effort recovery: mark any record still `building` for the
    /// session as failed. Returns how many records were touched.
    pub async fn fail_running(pool: &SqlitePool, session_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE app_build_versions
               SET status = 'failed',
                   updated_at = datetime('now', 'subsec')
               WHERE onboarding_session_id = $1
                 AND status = 'building'"#,
        )
        .bind(session_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, build_number, build_options, status, build_results, build_duration_ms, created_at, updated_at
               FROM app_build_versions
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, build_number, build_options, status, build_results, build_duration_ms, created_at, updated_at
               FROM app_build_versions
               WHERE onboarding_session_id = $1
               ORDER BY created_at DESC, rowid DESC"#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn build_numbers_increment_per_session_with_zero_padding() {
        let db = DBService::new_in_memory().await.unwrap();

        for expected in ["build-001", "build-002", "build-003", "build-004"] {
            let build = AppBuildVersion::create(&db.pool, "s1", "{}").await.unwrap();
            assert_eq!(build.build_number, expected);
            assert_eq!(build.status, BuildStatus::Building);
        }

        // Another session starts its own sequence.
        let other = AppBuildVersion::create(&db.pool, "s2", "{}").await.unwrap();
        assert_eq!(other.build_number, "build-001");
    }

    #[tokio::test]
    async fn finish_sets_terminal_state_once() {
        let db = DBService::new_in_memory().await.unwrap();
        let build = AppBuildVersion::create(&db.pool, "s1", r#"{"entities":true}"#)
            .await
            .unwrap();

        let results = BuildResults {
            entities: vec!["entities/Customer.json".to_string()],
            ..Default::default()
        };
        let results_json = serde_json::to_string(&results).unwrap();
        let finished =
            AppBuildVersion::finish(&db.pool, build.id, BuildStatus::Success, &results_json, 1200)
                .await
                .unwrap();

        assert_eq!(finished.status, BuildStatus::Success);
        assert_eq!(finished.build_duration_ms, Some(1200));
        let parsed = finished.parsed_results().unwrap();
        assert_eq!(parsed.entities, vec!["entities/Customer.json"]);
        assert!(parsed.errors.is_empty());
    }

    #[tokio::test]
    async fn fail_running_only_touches_building_records() {
        let db = DBService::new_in_memory().await.unwrap();
        let done = AppBuildVersion::create(&db.pool, "s1", "{}").await.unwrap();
        AppBuildVersion::finish(&db.pool, done.id, BuildStatus::Success, "{}", 10)
            .await
            .unwrap();
        let stuck = AppBuildVersion::create(&db.pool, "s1", "{}").await.unwrap();

        let touched = AppBuildVersion::fail_running(&db.pool, "s1").await.unwrap();
        assert_eq!(touched, 1);

        let reloaded = AppBuildVersion::find_by_id(&db.pool, stuck.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, BuildStatus::Failed);

        let untouched = AppBuildVersion::find_by_id(&db.pool, done.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, BuildStatus::Success);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(BuildStatus::Partial.to_string(), "partial");
        assert_eq!(
            serde_json::to_value(BuildStatus::Failed).unwrap(),
            serde_json::json!("failed")
        );
    }
}
