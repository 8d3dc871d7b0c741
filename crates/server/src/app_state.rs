use std::sync::Arc;

use db::DBService;
use services::services::{artifacts::ArtifactStore, completion::CompletionClient, config::Config};

/// Shared handles injected into every request. Handlers and the build
/// error-recovery path all work through this one state; nothing re-derives
/// a client mid-request.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub llm: Arc<dyn CompletionClient>,
    pub artifacts: ArtifactStore,
    pub config: Arc<Config>,
}
