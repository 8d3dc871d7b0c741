use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IntegrationEndpoint {
    pub name: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub purpose: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IntegrationAuth {
    #[serde(rename = "type", default)]
    pub auth_type: String,
    #[serde(default)]
    pub credentials_needed: Vec<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IntegrationSchema {
    pub id: Uuid,
    pub onboarding_session_id: String,
    pub integration_name: String,
    pub integration_type: String,
    pub description: String,
    pub provider: String,
    pub endpoints: String,      // JSON-serialized Vec<IntegrationEndpoint>
    pub authentication: String, // JSON-serialized IntegrationAuth
    pub priority: i64,
    pub created_at: DateTime<Utc>,
}

impl IntegrationSchema {
    pub fn parsed_endpoints(&self) -> Result<Vec<IntegrationEndpoint>, serde_json::Error> {
        serde_json::from_str(&self.endpoints)
    }

    pub fn parsed_authentication(&self) -> Result<IntegrationAuth, serde_json::Error> {
        serde_json::from_str(&self.authentication)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateIntegrationSchema {
    pub integration_name: String,
    pub integration_type: String,
    pub description: String,
    pub provider: String,
    pub endpoints: Vec<IntegrationEndpoint>,
    /// Stored as the literal `{}` when absent.
    pub authentication: Option<IntegrationAuth>,
    pub priority: i64,
}

impl IntegrationSchema {
    pub async fn create(
        pool: &SqlitePool,
        session_id: &str,
        data: &CreateIntegrationSchema,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let endpoints = serde_json::to_string(&data.endpoints)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        let authentication = match &data.authentication {
            Some(auth) => serde_json::to_string(auth)
                .map_err(|e| sqlx::Error::Protocol(e.to_string()))?,
            None => "{}".to_string(),
        };
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO integration_schemas (id, onboarding_session_id, integration_name, integration_type, description, provider, endpoints, authentication, priority)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING id, onboarding_session_id, integration_name, integration_type, description, provider, endpoints, authentication, priority, created_at"#,
        )
        .bind(id)
        .bind(session_id)
        .bind(&data.integration_name)
        .bind(&data.integration_type)
        .bind(&data.description)
        .bind(&data.provider)
        .bind(endpoints)
        .bind(authentication)
        .bind(data.priority)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_session(
        pool: &SqlitePool,
        session_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, onboarding_session_id, integration_name, integration_type, description, provider, endpoints, authentication, priority, created_at
               FROM integration_schemas
               WHERE onboarding_session_id = $1
               ORDER BY created_at ASC, rowid ASC"#,
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
    async fn missing_auth_is_stored_as_empty_object() {
        let db = DBService::new_in_memory().await.unwrap();
        let integration = IntegrationSchema::create(
            &db.pool,
            "s1",
            &CreateIntegrationSchema {
                integration_name: "Stripe Payments".to_string(),
                integration_type: "payment".to_string(),
                description: String::new(),
                provider: "stripe".to_string(),
                endpoints: vec![IntegrationEndpoint {
                    name: "charge".to_string(),
                    method: "POST".to_string(),
                    path: "/v1/charges".to_string(),
                    purpose: "take payment".to_string(),
                }],
                authentication: None,
                priority: 999,
            },
        )
        .await
        .unwrap();

        assert_eq!(integration.authentication, "{}");
        let auth = integration.parsed_authentication().unwrap();
        assert_eq!(auth.auth_type, "");
        assert!(auth.credentials_needed.is_empty());
        assert_eq!(integration.parsed_endpoints().unwrap()[0].method, "POST");
    }

    #[tokio::test]
    async fn explicit_auth_round_trips() {
        let db = DBService::new_in_memory().await.unwrap();
        let integration = IntegrationSchema::create(
            &db.pool,
            "s1",
            &CreateIntegrationSchema {
                integration_name: "Twilio".to_string(),
                integration_type: "sms".to_string(),
                description: String::new(),
                provider: "twilio".to_string(),
                endpoints: vec![],
                authentication: Some(IntegrationAuth {
                    auth_type: "api_key".to_string(),
                    credentials_needed: vec!["TWILIO_AUTH_TOKEN".to_string()],
                }),
                priority: 2,
            },
        )
        .await
        .unwrap();

        let auth = integration.parsed_authentication().unwrap();
        assert_eq!(auth.auth_type, "api_key");
        assert_eq!(auth.credentials_needed, vec!["TWILIO_AUTH_TOKEN"]);
    }
}
