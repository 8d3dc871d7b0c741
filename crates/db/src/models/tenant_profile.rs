use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenantProfile {
    pub id: Uuid,
    pub tenant_id: String,
    pub company_name: String,
    pub industry: String,
    pub company_size: String,
    pub locale: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateTenantProfile {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub locale: Option<String>,
}

impl TenantProfile {
    /// One profile per tenant; a second write replaces the stored values.
    pub async fn create_or_update(
        pool: &SqlitePool,
        tenant_id: &str,
        data: &CreateTenantProfile,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO tenant_profiles (id, tenant_id, company_name, industry, company_size, locale)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT(tenant_id) DO UPDATE SET
                   company_name = excluded.company_name,
                   industry = excluded.industry,
                   company_size = excluded.company_size,
                   locale = excluded.locale,
                   updated_at = datetime('now', 'subsec')
               RETURNING id, tenant_id, company_name, industry, company_size, locale, created_at, updated_at"#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(data.company_name.as_deref().unwrap_or(""))
        .bind(data.industry.as_deref().unwrap_or(""))
        .bind(data.company_size.as_deref().unwrap_or(""))
        .bind(data.locale.as_deref().unwrap_or(""))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_tenant(
        pool: &SqlitePool,
        tenant_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, tenant_id, company_name, industry, company_size, locale, created_at, updated_at
               FROM tenant_profiles
               WHERE tenant_id = $1"#,
        )
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn upsert_replaces_existing_profile() {
        let db = DBService::new_in_memory().await.unwrap();
        let first = TenantProfile::create_or_update(
            &db.pool,
            "t1",
            &CreateTenantProfile {
                company_name: Some("Acme".to_string()),
                industry: None,
                company_size: None,
                locale: None,
            },
        )
        .await
        .unwrap();

        let second = TenantProfile::create_or_update(
            &db.pool,
            "t1",
            &CreateTenantProfile {
                company_name: Some("Acme Corp".to_string()),
                industry: Some("logistics".to_string()),
                company_size: None,
                locale: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.company_name, "Acme Corp");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenant_profiles")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
