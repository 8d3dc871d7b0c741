//! Shared fixtures for router tests: an in-memory state with a seeded
//! service account and a scripted model client.

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::Request,
    response::Response,
};
use db::{DBService, models::user::User};
use serde_json::Value;
use services::services::{
    artifacts::ArtifactStore, claude_api::ClaudeApiError, completion::CompletionClient,
    config::Config,
};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{app_state::AppState, routes};

pub const TOKEN: &str = "test-api-key";

/// Hands out canned completions in order; panics when the script runs dry,
/// which doubles as an assertion that no unexpected model call happened.
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String, ClaudeApiError>>>,
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
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

pub struct TestApp {
    pub state: AppState,
    router: Router,
    artifacts_dir: TempDir,
}

impl TestApp {
    pub async fn new(responses: Vec<Result<String, ClaudeApiError>>) -> Self {
        let db = DBService::new_in_memory().await.unwrap();
        User::create(&db.pool, "tests@archforge.local", TOKEN)
            .await
            .unwrap();

        let artifacts_dir = tempfile::tempdir().unwrap();
        let state = AppState {
            db,
            llm: Arc::new(ScriptedCompletion {
                responses: Mutex::new(responses.into()),
            }),
            artifacts: ArtifactStore::new(artifacts_dir.path().to_path_buf()),
            config: Arc::new(Config {
                host: "127.0.0.1".to_string(),
                port: 0,
                data_dir: artifacts_dir.path().to_path_buf(),
                artifacts_dir: artifacts_dir.path().to_path_buf(),
                anthropic_api_key: None,
                claude_model: None,
                build_concurrency: 1,
                bootstrap_api_key: None,
            }),
        };

        let router = routes::router(state.clone());
        Self {
            state,
            router,
            artifacts_dir,
        }
    }

    pub async fn oneshot(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub fn artifacts_root(&self) -> PathBuf {
        self.artifacts_dir.path().to_path_buf()
    }
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
