//! Application build pipeline: read persisted schemas, emit one artifact per
//! record, track the attempt on an `app_build_versions` row.

use std::{sync::Arc, time::Instant};

use db::models::{
    app_build_version::{AppBuildVersion, BuildItemError, BuildResults, BuildStatus},
    entity_schema::EntitySchema,
    feature_schema::FeatureSchema,
    integration_schema::IntegrationSchema,
    knowledge_entry::{CreateKnowledgeEntry, KnowledgeEntry},
    page_schema::PageSchema,
};
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use utils::text::sanitize_component_name;

use super::{
    artifacts::{ArtifactCategory, ArtifactStore},
    claude_api::extract_code,
    completion::CompletionClient,
    prompts, schema_render,
};

/// Per-item generation targets a single file or document.
const ITEM_MAX_TOKENS: u32 = 4096;

/// Category toggles from the build request. An omitted toggle means the
/// category is skipped, so a request that enables nothing builds nothing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BuildOptions {
    #[serde(default)]
    pub build_entities: bool,
    #[serde(default)]
    pub build_pages: bool,
    #[serde(default)]
    pub build_features: bool,
    #[serde(default)]
    pub build_integrations: bool,
}

/// Infrastructure failures that abort a build outright. Per-item failures
/// never surface here; they land in `BuildResults::errors`.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub build: AppBuildVersion,
    pub results: BuildResults,
    pub status: BuildStatus,
}

/// Terminal status from the build counters. A run that attempted nothing
/// accomplished nothing, so it is failed rather than vacuously successful.
pub fn classify(attempted: usize, succeeded: usize, errors: usize) -> BuildStatus {
    if attempted == 0 {
        BuildStatus::Failed
    } else if errors == 0 {
        BuildStatus::Success
    } else if succeeded > 0 {
        BuildStatus::Partial
    } else {
        BuildStatus::Failed
    }
}

pub struct AppBuilder {
    pool: SqlitePool,
    llm: Arc<dyn CompletionClient>,
    artifacts: ArtifactStore,
    concurrency: usize,
}

impl AppBuilder {
    pub fn new(
        pool: SqlitePool,
        llm: Arc<dyn CompletionClient>,
        artifacts: ArtifactStore,
        concurrency: usize,
    ) -> Self {
        Self {
            pool,
            llm,
            artifacts,
            concurrency: concurrency.max(1),
        }
    }

    /// Run one build for a session. Records the attempt first, then walks
    /// the enabled categories in fixed order, then finishes the record with
    /// the computed status. Every schema record in an enabled category
    /// counts as attempted whether or not its artifact was produced.
    pub async fn build(
        &self,
        session_id: &str,
        options: BuildOptions,
    ) -> Result<BuildOutcome, BuildError> {
        let options_json = serde_json::to_string(&options)?;
        let build = AppBuildVersion::create(&self.pool, session_id, &options_json).await?;
        info!(
            session_id,
            build_number = %build.build_number,
            "starting application build"
        );
        let started = Instant::now();

        let mut results = BuildResults::default();
        let mut attempted = 0usize;

        if options.build_entities {
            attempted += self.build_entities(session_id, &mut results).await?;
        }
        if options.build_pages {
            attempted += self.build_pages(session_id, &mut results).await?;
        }
        if options.build_features {
            attempted += self.build_features(session_id, &mut results).await?;
        }
        if options.build_integrations {
            attempted += self.build_integrations(session_id, &mut results).await?;
        }

        let succeeded = results.entities.len()
            + results.pages.len()
            + results.features.len()
            + results.integrations.len();
        let status = classify(attempted, succeeded, results.errors.len());

        let results_json = serde_json::to_string(&results)?;
        let duration_ms = started.elapsed().as_millis() as i64;
        let build =
            AppBuildVersion::finish(&self.pool, build.id, status, &results_json, duration_ms)
                .await?;

        info!(
            session_id,
            build_number = %build.build_number,
            status = %status,
            attempted,
            succeeded,
            errors = results.errors.len(),
            duration_ms,
            "application build finished"
        );

        Ok(BuildOutcome {
            build,
            results,
            status,
        })
    }

    /// Deterministic pass: render a JSON Schema document per entity. No
    /// model call, so no concurrency either.
    async fn build_entities(
        &self,
        session_id: &str,
        results: &mut BuildResults,
    ) -> Result<usize, BuildError> {
        let entities = EntitySchema::find_by_session(&self.pool, session_id).await?;
        for entity in &entities {
            match self.render_entity(session_id, entity).await {
                Ok(path) => results.entities.push(path),
                Err(error) => {
                    warn!(entity = %entity.entity_name, %error, "entity render failed");
                    results.errors.push(BuildItemError {
                        item_type: "entity".to_string(),
                        name: entity.entity_name.clone(),
                        error,
                    });
                }
            }
        }
        Ok(entities.len())
    }

    async fn render_entity(
        &self,
        session_id: &str,
        entity: &EntitySchema,
    ) -> Result<String, String> {
        let document = schema_render::entity_json_schema(entity).map_err(|e| e.to_string())?;
        let body = serde_json::to_string_pretty(&document).map_err(|e| e.to_string())?;
        let file_name = format!("{}.json", sanitize_component_name(&entity.entity_name));
        self.artifacts
            .write(session_id, ArtifactCategory::Entities, &file_name, &body)
            .await
            .map_err(|e| e.to_string())
    }

    async fn build_pages(
        &self,
        session_id: &str,
        results: &mut BuildResults,
    ) -> Result<usize, BuildError> {
        let pages = PageSchema::find_by_session(&self.pool, session_id).await?;
        let futures: Vec<_> = pages
            .iter()
            .map(|page| self.generate_page(session_id, page))
            .collect();
        let outcomes: Vec<Result<String, String>> = stream::iter(futures)
            .buffered(self.concurrency)
            .collect()
            .await;

        for (page, outcome) in pages.iter().zip(outcomes) {
            match outcome {
                Ok(path) => results.pages.push(path),
                Err(error) => {
                    warn!(page = %page.page_name, %error, "page generation failed");
                    results.errors.push(BuildItemError {
                        item_type: "page".to_string(),
                        name: page.page_name.clone(),
                        error,
                    });
                }
            }
        }
        Ok(pages.len())
    }

    async fn generate_page(&self, session_id: &str, page: &PageSchema) -> Result<String, String> {
        let prompt = prompts::page_component_prompt(page);
        let raw = self
            .llm
            .complete(&prompt, Some(prompts::PAGE_SYSTEM.to_string()), ITEM_MAX_TOKENS)
            .await
            .map_err(|e| e.to_string())?;
        let source = extract_code(&raw);
        let file_name = format!("{}.jsx", sanitize_component_name(&page.page_name));
        self.artifacts
            .write(session_id, ArtifactCategory::Pages, &file_name, source)
            .await
            .map_err(|e| e.to_string())
    }

    /// Feature documentation lands in the knowledge base, not on disk, so
    /// the results list carries feature names rather than paths.
    async fn build_features(
        &self,
        session_id: &str,
        results: &mut BuildResults,
    ) -> Result<usize, BuildError> {
        let features = FeatureSchema::find_by_session(&self.pool, session_id).await?;
        let futures: Vec<_> = features
            .iter()
            .map(|feature| self.generate_feature_doc(session_id, feature))
            .collect();
        let outcomes: Vec<Result<(), String>> = stream::iter(futures)
            .buffered(self.concurrency)
            .collect()
            .await;

        for (feature, outcome) in features.iter().zip(outcomes) {
            match outcome {
                Ok(()) => results.features.push(feature.feature_name.clone()),
                Err(error) => {
                    warn!(feature = %feature.feature_name, %error, "feature documentation failed");
                    results.errors.push(BuildItemError {
                        item_type: "feature".to_string(),
                        name: feature.feature_name.clone(),
                        error,
                    });
                }
            }
        }
        Ok(features.len())
    }

    async fn generate_feature_doc(
        &self,
        session_id: &str,
        feature: &FeatureSchema,
    ) -> Result<(), String> {
        let prompt = prompts::feature_doc_prompt(feature);
        let answer = self
            .llm
            .complete(
                &prompt,
                Some(prompts::FEATURE_SYSTEM.to_string()),
                ITEM_MAX_TOKENS,
            )
            .await
            .map_err(|e| e.to_string())?;

        KnowledgeEntry::create(
            &self.pool,
            session_id,
            &CreateKnowledgeEntry {
                question: format!(
                    "How should the '{}' feature be implemented?",
                    feature.feature_name
                ),
                answer,
                source: "ai".to_string(),
                is_important: feature.priority == "must_have",
                tags: vec!["feature".to_string(), "implementation".to_string()],
            },
        )
        .await
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn build_integrations(
        &self,
        session_id: &str,
        results: &mut BuildResults,
    ) -> Result<usize, BuildError> {
        let integrations = IntegrationSchema::find_by_session(&self.pool, session_id).await?;
        let futures: Vec<_> = integrations
            .iter()
            .map(|integration| self.generate_integration(session_id, integration))
            .collect();
        let outcomes: Vec<Result<String, String>> = stream::iter(futures)
            .buffered(self.concurrency)
            .collect()
            .await;

        for (integration, outcome) in integrations.iter().zip(outcomes) {
            match outcome {
                Ok(path) => results.integrations.push(path),
                Err(error) => {
                    warn!(
                        integration = %integration.integration_name,
                        %error,
                        "integration handler generation failed"
                    );
                    results.errors.push(BuildItemError {
                        item_type: "integration".to_string(),
                        name: integration.integration_name.clone(),
                        error,
                    });
                }
            }
        }
        Ok(integrations.len())
    }

    async fn generate_integration(
        &self,
        session_id: &str,
        integration: &IntegrationSchema,
    ) -> Result<String, String> {
        let prompt = prompts::integration_handler_prompt(integration);
        let raw = self
            .llm
            .complete(
                &prompt,
                Some(prompts::INTEGRATION_SYSTEM.to_string()),
                ITEM_MAX_TOKENS,
            )
            .await
            .map_err(|e| e.to_string())?;
        let source = extract_code(&raw);
        let file_name = format!(
            "{}.ts",
            sanitize_component_name(&integration.integration_name)
        );
        self.artifacts
            .write(session_id, ArtifactCategory::Integrations, &file_name, source)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;
    use db::{
        DBService,
        models::{
            entity_schema::{CreateEntitySchema, EntityField},
            feature_schema::CreateFeatureSchema,
            integration_schema::CreateIntegrationSchema,
            page_schema::CreatePageSchema,
        },
    };
    use tempfile::TempDir;

    use super::*;
    use crate::services::claude_api::ClaudeApiError;

    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, ClaudeApiError>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, ClaudeApiError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            _prompt: &str,
            _system: Option<String>,
            _max_tokens: u32,
        ) -> Result<String, ClaudeApiError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left")
        }
    }

    fn builder_with(
        db: &DBService,
        llm: Arc<ScriptedClient>,
        tmp: &TempDir,
        concurrency: usize,
    ) -> AppBuilder {
        AppBuilder::new(
            db.pool.clone(),
            llm,
            ArtifactStore::new(tmp.path().to_path_buf()),
            concurrency,
        )
    }

    async fn seed_entity(db: &DBService, name: &str) {
        EntitySchema::create(
            &db.pool,
            "s1",
            &CreateEntitySchema {
                entity_name: name.to_string(),
                description: String::new(),
                fields: vec![EntityField {
                    name: "name".to_string(),
                    field_type: "string".to_string(),
                    required: true,
                    description: String::new(),
                    allowed_values: None,
                    default: None,
                }],
                relationships: vec![],
                priority: 1,
            },
        )
        .await
        .unwrap();
    }

    async fn seed_page(db: &DBService, name: &str) {
        PageSchema::create(
            &db.pool,
            "s1",
            &CreatePageSchema {
                page_name: name.to_string(),
                page_type: "list".to_string(),
                description: String::new(),
                primary_entity: "Customer".to_string(),
                data_sources: vec![],
                actions: vec![],
                priority: 1,
            },
        )
        .await
        .unwrap();
    }

    async fn seed_feature(db: &DBService, name: &str, priority: &str) {
        FeatureSchema::create(
            &db.pool,
            "s1",
            &CreateFeatureSchema {
                feature_name: name.to_string(),
                description: String::new(),
                user_stories: vec![],
                workflow: vec![],
                entities_involved: vec![],
                pages_involved: vec![],
                business_rules: vec![],
                priority: priority.to_string(),
            },
        )
        .await
        .unwrap();
    }

    async fn seed_integration(db: &DBService, name: &str) {
        IntegrationSchema::create(
            &db.pool,
            "s1",
            &CreateIntegrationSchema {
                integration_name: name.to_string(),
                integration_type: "payment".to_string(),
                description: String::new(),
                provider: "stripe".to_string(),
                endpoints: vec![],
                authentication: None,
                priority: 1,
            },
        )
        .await
        .unwrap();
    }

    fn entities_only() -> BuildOptions {
        BuildOptions {
            build_entities: true,
            build_pages: false,
            build_features: false,
            build_integrations: false,
        }
    }

    #[test]
    fn classify_covers_every_band() {
        assert_eq!(classify(0, 0, 0), BuildStatus::Failed);
        assert_eq!(classify(3, 3, 0), BuildStatus::Success);
        assert_eq!(classify(3, 1, 2), BuildStatus::Partial);
        assert_eq!(classify(2, 0, 2), BuildStatus::Failed);
        // No errors at all counts as success even if some items vanished.
        assert_eq!(classify(2, 1, 0), BuildStatus::Success);
    }

    #[test]
    fn omitted_toggles_mean_skip() {
        let options: BuildOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.build_entities);
        assert!(!options.build_pages);
        assert!(!options.build_features);
        assert!(!options.build_integrations);

        let options: BuildOptions = serde_json::from_str(r#"{"buildPages":true}"#).unwrap();
        assert!(options.build_pages);
        assert!(!options.build_entities);
    }

    #[tokio::test]
    async fn entity_pass_renders_schemas_without_the_model() {
        let db = DBService::new_in_memory().await.unwrap();
        seed_entity(&db, "Customer").await;
        seed_entity(&db, "Work Order").await;

        let tmp = tempfile::tempdir().unwrap();
        // An empty script panics on any model call, which is the point.
        let builder = builder_with(&db, ScriptedClient::new(vec![]), &tmp, 4);

        let outcome = builder.build("s1", entities_only()).await.unwrap();

        assert_eq!(outcome.status, BuildStatus::Success);
        assert_eq!(
            outcome.results.entities,
            vec!["entities/Customer.json", "entities/WorkOrder.json"]
        );
        assert!(outcome.results.errors.is_empty());

        let on_disk = tmp.path().join("s1/entities/WorkOrder.json");
        let body: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(on_disk).unwrap()).unwrap();
        assert_eq!(body["title"], "Work Order");

        assert_eq!(outcome.build.status, BuildStatus::Success);
        assert_eq!(outcome.build.build_number, "build-001");
        assert!(outcome.build.build_options.contains("\"buildEntities\":true"));
        let persisted = outcome.build.parsed_results().unwrap();
        assert_eq!(persisted.entities.len(), 2);
        assert!(outcome.build.build_duration_ms.unwrap() >= 0);
    }

    #[tokio::test]
    async fn nothing_attempted_is_a_failed_build_with_no_errors() {
        let db = DBService::new_in_memory().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let builder = builder_with(&db, ScriptedClient::new(vec![]), &tmp, 4);

        // Entities enabled but no entity records exist for the session.
        let outcome = builder.build("s1", entities_only()).await.unwrap();

        assert_eq!(outcome.status, BuildStatus::Failed);
        assert!(outcome.results.errors.is_empty());
        assert_eq!(outcome.build.status, BuildStatus::Failed);
    }

    #[tokio::test]
    async fn failed_pages_are_recorded_and_the_build_is_partial() {
        let db = DBService::new_in_memory().await.unwrap();
        seed_page(&db, "Customer List").await;
        seed_page(&db, "Dispatch Board").await;

        let tmp = tempfile::tempdir().unwrap();
        let llm = ScriptedClient::new(vec![
            Ok("```jsx\nexport default function CustomerList() {}\n```".to_string()),
            Err(ClaudeApiError::Timeout),
        ]);
        // Concurrency 1 keeps the scripted responses paired with store order.
        let builder = builder_with(&db, llm, &tmp, 1);

        let options = BuildOptions {
            build_entities: false,
            build_pages: true,
            build_features: false,
            build_integrations: false,
        };
        let outcome = builder.build("s1", options).await.unwrap();

        assert_eq!(outcome.status, BuildStatus::Partial);
        assert_eq!(outcome.results.pages, vec!["pages/CustomerList.jsx"]);
        assert_eq!(outcome.results.errors.len(), 1);
        assert_eq!(outcome.results.errors[0].item_type, "page");
        assert_eq!(outcome.results.errors[0].name, "Dispatch Board");

        let source = std::fs::read_to_string(tmp.path().join("s1/pages/CustomerList.jsx")).unwrap();
        assert!(source.contains("export default function CustomerList"));
        assert!(!source.contains("```"));
    }

    #[tokio::test]
    async fn every_item_failing_marks_the_build_failed() {
        let db = DBService::new_in_memory().await.unwrap();
        seed_page(&db, "Customer List").await;

        let tmp = tempfile::tempdir().unwrap();
        let llm = ScriptedClient::new(vec![Err(ClaudeApiError::Timeout)]);
        let builder = builder_with(&db, llm, &tmp, 1);

        let options = BuildOptions {
            build_entities: false,
            build_pages: true,
            build_features: false,
            build_integrations: false,
        };
        let outcome = builder.build("s1", options).await.unwrap();

        assert_eq!(outcome.status, BuildStatus::Failed);
        assert!(outcome.results.pages.is_empty());
        assert_eq!(outcome.results.errors.len(), 1);
        let persisted = outcome.build.parsed_results().unwrap();
        assert_eq!(persisted.errors[0].name, "Customer List");
    }

    #[tokio::test]
    async fn features_become_knowledge_entries_not_files() {
        let db = DBService::new_in_memory().await.unwrap();
        seed_feature(&db, "Order Tracking", "must_have").await;
        seed_feature(&db, "Reporting", "nice_to_have").await;

        let tmp = tempfile::tempdir().unwrap();
        let llm = ScriptedClient::new(vec![
            Ok("## Implementation\nTrack orders end to end.".to_string()),
            Ok("## Implementation\nShip a report screen.".to_string()),
        ]);
        let builder = builder_with(&db, llm, &tmp, 1);

        let options = BuildOptions {
            build_entities: false,
            build_pages: false,
            build_features: true,
            build_integrations: false,
        };
        let outcome = builder.build("s1", options).await.unwrap();

        assert_eq!(outcome.status, BuildStatus::Success);
        assert_eq!(outcome.results.features, vec!["Order Tracking", "Reporting"]);

        let entries = KnowledgeEntry::find_by_session(&db.pool, "s1").await.unwrap();
        assert_eq!(entries.len(), 2);
        let tracking = entries
            .iter()
            .find(|e| e.question.contains("Order Tracking"))
            .unwrap();
        assert_eq!(
            tracking.question,
            "How should the 'Order Tracking' feature be implemented?"
        );
        assert_eq!(tracking.source, "ai");
        assert!(tracking.is_important);
        assert!(tracking.answer.contains("Track orders"));
        let reporting = entries
            .iter()
            .find(|e| e.question.contains("Reporting"))
            .unwrap();
        assert!(!reporting.is_important);

        // Nothing for this category lands on disk.
        assert!(!tmp.path().join("s1").exists());
    }

    #[tokio::test]
    async fn integration_file_names_are_stripped_to_alphanumerics() {
        let db = DBService::new_in_memory().await.unwrap();
        seed_integration(&db, "Stripe Payments!!").await;

        let tmp = tempfile::tempdir().unwrap();
        let llm = ScriptedClient::new(vec![Ok(
            "```ts\nexport const config = { provider: 'stripe' };\n```".to_string(),
        )]);
        let builder = builder_with(&db, llm, &tmp, 1);

        let options = BuildOptions {
            build_entities: false,
            build_pages: false,
            build_features: false,
            build_integrations: true,
        };
        let outcome = builder.build("s1", options).await.unwrap();

        assert_eq!(
            outcome.results.integrations,
            vec!["integrations/StripePayments.ts"]
        );
        assert!(tmp.path().join("s1/integrations/StripePayments.ts").exists());
    }

    #[tokio::test]
    async fn disabled_categories_never_touch_their_records() {
        let db = DBService::new_in_memory().await.unwrap();
        seed_entity(&db, "Customer").await;
        seed_page(&db, "Customer List").await;
        seed_integration(&db, "Stripe").await;

        let tmp = tempfile::tempdir().unwrap();
        let builder = builder_with(&db, ScriptedClient::new(vec![]), &tmp, 4);

        let outcome = builder.build("s1", entities_only()).await.unwrap();

        assert_eq!(outcome.status, BuildStatus::Success);
        assert_eq!(outcome.results.entities.len(), 1);
        assert!(outcome.results.pages.is_empty());
        assert!(outcome.results.integrations.is_empty());
        assert!(!tmp.path().join("s1/pages").exists());
    }

    #[tokio::test]
    async fn build_numbers_advance_across_runs() {
        let db = DBService::new_in_memory().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let builder = builder_with(&db, ScriptedClient::new(vec![]), &tmp, 4);

        let first = builder.build("s1", entities_only()).await.unwrap();
        let second = builder.build("s1", entities_only()).await.unwrap();

        assert_eq!(first.build.build_number, "build-001");
        assert_eq!(second.build.build_number, "build-002");
    }
}
