use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Service identity. Accounts are provisioned operationally (bootstrap env
/// or manual insert); there is no signup surface.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        api_key: &str,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO users (id, email, api_key)
               VALUES ($1, $2, $3)
               RETURNING id, email, api_key, created_at"#,
        )
        .bind(id)
        .bind(email)
        .bind(api_key)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_api_key(
        pool: &SqlitePool,
        api_key: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, email, api_key, created_at
               FROM users
               WHERE api_key = $1"#,
        )
        .bind(api_key)
        .fetch_optional(pool)
        .await
    }

    /// Idempotent startup provisioning: insert the account or rotate its
    /// key if the email already exists.
    pub async fn ensure_bootstrap(
        pool: &SqlitePool,
        email: &str,
        api_key: &str,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO users (id, email, api_key)
               VALUES ($1, $2, $3)
               ON CONFLICT(email) DO UPDATE SET api_key = excluded.api_key
               RETURNING id, email, api_key, created_at"#,
        )
        .bind(id)
        .bind(email)
        .bind(api_key)
        .fetch_one(pool)
        .await
    }
}
