use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OperationalProcess {
    pub id: Uuid,
    pub onboarding_session_id: String,
    pub process_name: String,
    pub description: String,
    pub monthly_volume: Option<i64>,
    pub pain_points: Option<String>,      // JSON-serialized Vec<String>
    pub desired_outcomes: Option<String>, // JSON-serialized Vec<String>
    pub created_at: DateTime<Utc>,
}

impl OperationalProcess {
    pub fn parsed_pain_points(&self) -> Vec<String> {
        parse_string_array(self.pain_points.as_deref())
    }

    pub fn parsed_desired_outcomes(&self) -> Vec<String> {
        parse_string_array(self.desired_outcomes.as_deref())
    }
}

fn parse_string_array(json: Option<&str>) -> Vec<String> {
    json.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOperationalProcess {
    pub process_name: String,
    pub description: Option<String>,
    pub monthly_volume: Option<i64>,
    pub pain_points: Option<Vec<String>>,
    pub desired_outcomes: Option<Vec<String>>,
}

impl OperationalProcess {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &CreateOperationalProcess,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let pain_points = encode_string_array(data.pain_points.as_ref())?;
        let desired_outcomes = encode_string_array(data.desired_outcomes.as_ref())?;
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO operational_processes (id, onboarding_session_id, process_name, description, monthly_volume, pain_points, desired_outcomes)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, onboarding_session_id, process_name, description, monthly_volume, pain_points, desired_outcomes, created_at"#,
        )
        .bind(id)
        .bind(session_id)
        .bind(&data.process_name)
        .bind(data.description.as_deref().unwrap_or(""))
        .bind(data.monthly_volume)
        .bind(pain_points)
        .bind(desired_outcomes)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, process_name, description, monthly_volume, pain_points, desired_outcomes, created_at
               FROM operational_processes
               WHERE onboarding_session_id = $1
               ORDER BY created_at ASC, rowid ASC"#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }
}

fn encode_string_array(values: Option<&Vec<String>>) -> Result<Option<String>, sqlx::Error> {
    values
        .map(|v| serde_json::to_string(v).map_err(|e| sqlx::Error::Protocol(e.to_string())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn missing_arrays_parse_to_empty() {
        let db = DBService::new_in_memory().await.unwrap();
        let process = OperationalProcess::create(
            &db.pool,
            "s1",
            &CreateOperationalProcess {
                process_name: "Order Management".to_string(),
                description: None,
                monthly_volume: Some(200),
                pain_points: None,
                desired_outcomes: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(process.monthly_volume, Some(200));
        assert!(process.parsed_pain_points().is_empty());
        assert!(process.parsed_desired_outcomes().is_empty());
    }

    #[tokio::test]
    async fn arrays_round_trip_through_json_columns() {
        let db = DBService::new_in_memory().await.unwrap();
        let process = OperationalProcess::create(
            &db.pool,
            "s1",
            &CreateOperationalProcess {
                process_name: "Dispatch".to_string(),
                description: Some("daily crew dispatch".to_string()),
                monthly_volume: None,
                pain_points: Some(vec!["manual".to_string(), "slow".to_string()]),
                desired_outcomes: Some(vec!["automated routing".to_string()]),
            },
        )
        .await
        .unwrap();

        assert_eq!(process.parsed_pain_points(), vec!["manual", "slow"]);
        assert_eq!(process.parsed_desired_outcomes(), vec!["automated routing"]);
    }
}
