//! Architecture generation pipeline: assemble context, ask the model once,
//! persist every proposed element as a schema record.

use std::sync::Arc;

use db::models::{
    entity_schema::{CreateEntitySchema, EntityField, EntityRelationship, EntitySchema},
    feature_schema::{CreateFeatureSchema, FeatureSchema, UserStory, WorkflowStep},
    integration_schema::{
        CreateIntegrationSchema, IntegrationAuth, IntegrationEndpoint, IntegrationSchema,
    },
    page_schema::{CreatePageSchema, PageAction, PageDataSource, PageSchema},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};
use ts_rs::TS;

use super::{
    claude_api::{ClaudeApiError, extract_json},
    completion::CompletionClient,
    context::{ContextAssembler, ContextError},
    prompts,
};

/// Architecture proposals are a single large document; give the model room.
const ARCHITECTURE_MAX_TOKENS: u32 = 8192;

/// Numeric rank assigned when the model omits one.
pub const DEFAULT_PRIORITY: i64 = 999;
/// Label assigned to features when the model omits one.
pub const DEFAULT_FEATURE_PRIORITY: &str = "should_have";

#[derive(Debug, Error)]
pub enum ArchitectureError {
    #[error("session not found")]
    SessionNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("claude api error: {0}")]
    Claude(#[from] ClaudeApiError),
    #[error("invalid architecture response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<ContextError> for ArchitectureError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::SessionNotFound => Self::SessionNotFound,
            ContextError::Database(e) => Self::Database(e),
        }
    }
}

/// The model's proposal document. Absent arrays mean "propose nothing of
/// this kind", so everything defaults.
#[derive(Debug, Default, Deserialize)]
struct ProposedArchitecture {
    #[serde(default)]
    entities: Vec<ProposedEntity>,
    #[serde(default)]
    pages: Vec<ProposedPage>,
    #[serde(default)]
    features: Vec<ProposedFeature>,
    #[serde(default)]
    integrations: Vec<ProposedIntegration>,
}

#[derive(Debug, Deserialize)]
struct ProposedEntity {
    entity_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    fields: Vec<EntityField>,
    #[serde(default)]
    relationships: Vec<EntityRelationship>,
    priority: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProposedPage {
    page_name: String,
    #[serde(default)]
    page_type: String,
    #[serde(default)]
    description: String,
    primary_entity: Option<String>,
    #[serde(default)]
    data_sources: Vec<PageDataSource>,
    #[serde(default)]
    actions: Vec<PageAction>,
    priority: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProposedFeature {
    feature_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    user_stories: Vec<UserStory>,
    #[serde(default)]
    workflow: Vec<WorkflowStep>,
    #[serde(default)]
    entities_involved: Vec<String>,
    #[serde(default)]
    pages_involved: Vec<String>,
    #[serde(default)]
    business_rules: Vec<String>,
    priority: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProposedIntegration {
    integration_name: String,
    #[serde(default)]
    integration_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    provider: String,
    #[serde(default)]
    endpoints: Vec<IntegrationEndpoint>,
    authentication: Option<IntegrationAuth>,
    priority: Option<i64>,
}

/// Everything one generation round created.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct GeneratedArchitecture {
    pub entities: Vec<EntitySchema>,
    pub pages: Vec<PageSchema>,
    pub features: Vec<FeatureSchema>,
    pub integrations: Vec<IntegrationSchema>,
}

pub struct ArchitectureService {
    pool: SqlitePool,
    llm: Arc<dyn CompletionClient>,
}

impl ArchitectureService {
    pub fn new(pool: SqlitePool, llm: Arc<dyn CompletionClient>) -> Self {
        Self { pool, llm }
    }

    /// Run one proposal round for a session. Nothing is persisted unless
    /// the model call and parse both succeed; a failed insert mid-way
    /// leaves earlier records in place and aborts the rest.
    pub async fn generate(
        &self,
        session_id: &str,
    ) -> Result<GeneratedArchitecture, ArchitectureError> {
        let context = ContextAssembler::new(self.pool.clone())
            .assemble(session_id)
            .await?;
        let context_json = serde_json::to_string_pretty(&context)?;

        let prompt = prompts::architecture_prompt(&context_json);
        let raw = self
            .llm
            .complete(
                &prompt,
                Some(prompts::ARCHITECTURE_SYSTEM.to_string()),
                ARCHITECTURE_MAX_TOKENS,
            )
            .await?;

        let proposed = parse_architecture(&raw)?;
        info!(
            session_id,
            entities = proposed.entities.len(),
            pages = proposed.pages.len(),
            features = proposed.features.len(),
            integrations = proposed.integrations.len(),
            "received architecture proposal"
        );

        self.persist(session_id, proposed).await
    }

    /// One insert per proposed item, in document order, no batching and no
    /// rollback across items.
    async fn persist(
        &self,
        session_id: &str,
        proposed: ProposedArchitecture,
    ) -> Result<GeneratedArchitecture, ArchitectureError> {
        let mut entities = Vec::with_capacity(proposed.entities.len());
        for entity in proposed.entities {
            let created = EntitySchema::create(
                &self.pool,
                session_id,
                &CreateEntitySchema {
                    entity_name: entity.entity_name,
                    description: entity.description,
                    fields: entity.fields,
                    relationships: entity.relationships,
                    priority: entity.priority.unwrap_or(DEFAULT_PRIORITY),
                },
            )
            .await?;
            entities.push(created);
        }

        let mut pages = Vec::with_capacity(proposed.pages.len());
        for page in proposed.pages {
            let created = PageSchema::create(
                &self.pool,
                session_id,
                &CreatePageSchema {
                    page_name: page.page_name,
                    page_type: page.page_type,
                    description: page.description,
                    primary_entity: page.primary_entity.unwrap_or_default(),
                    data_sources: page.data_sources,
                    actions: page.actions,
                    priority: page.priority.unwrap_or(DEFAULT_PRIORITY),
                },
            )
            .await?;
            pages.push(created);
        }

        let mut features = Vec::with_capacity(proposed.features.len());
        for feature in proposed.features {
            let created = FeatureSchema::create(
                &self.pool,
                session_id,
                &CreateFeatureSchema {
                    feature_name: feature.feature_name,
                    description: feature.description,
                    user_stories: feature.user_stories,
                    workflow: feature.workflow,
                    entities_involved: feature.entities_involved,
                    pages_involved: feature.pages_involved,
                    business_rules: feature.business_rules,
                    priority: feature
                        .priority
                        .unwrap_or_else(|| DEFAULT_FEATURE_PRIORITY.to_string()),
                },
            )
            .await?;
            features.push(created);
        }

        let mut integrations = Vec::with_capacity(proposed.integrations.len());
        for integration in proposed.integrations {
            let created = IntegrationSchema::create(
                &self.pool,
                session_id,
                &CreateIntegrationSchema {
                    integration_name: integration.integration_name,
                    integration_type: integration.integration_type,
                    description: integration.description,
                    provider: integration.provider,
                    endpoints: integration.endpoints,
                    authentication: integration.authentication,
                    priority: integration.priority.unwrap_or(DEFAULT_PRIORITY),
                },
            )
            .await?;
            integrations.push(created);
        }

        info!(
            session_id,
            entities = entities.len(),
            pages = pages.len(),
            features = features.len(),
            integrations = integrations.len(),
            "persisted architecture schemas"
        );

        Ok(GeneratedArchitecture {
            entities,
            pages,
            features,
            integrations,
        })
    }
}

fn parse_architecture(raw: &str) -> Result<ProposedArchitecture, ArchitectureError> {
    let json = extract_json(raw);
    serde_json::from_str(json).map_err(|e| {
        error!(
            json_error = %e,
            preview = %json.chars().take(500).collect::<String>(),
            "architecture response did not parse"
        );
        ArchitectureError::Parse(e)
    })
}
