//! Startup schema check so a bad data directory fails fast instead of on
//! the first request.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SchemaCheckError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("missing tables: {0}")]
    MissingTables(String),
}

/// Every table the two pipelines read or write.
const REQUIRED_TABLES: &[&str] = &[
    "users",
    "onboarding_sessions",
    "business_profiles",
    "tenant_profiles",
    "operational_processes",
    "requirements",
    "entity_schemas",
    "page_schemas",
    "feature_schemas",
    "integration_schemas",
    "app_build_versions",
    "knowledge_entries",
];

pub struct SchemaCheck {
    pool: SqlitePool,
}

impl SchemaCheck {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run(&self) -> Result<(), SchemaCheckError> {
        let mut missing = Vec::new();
        for table in REQUIRED_TABLES {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
            )
            .bind(table)
            .fetch_one(&self.pool)
            .await?
                > 0;
            if !exists {
                missing.push(table.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(SchemaCheckError::MissingTables(missing.join(", ")));
        }

        let migrations_applied = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
        )
        .fetch_one(&self.pool)
        .await?;
        info!(migrations_applied, "database schema check passed");

        Ok(())
    }
}
