use std::sync::Arc;

use anyhow::Context;
use db::{DBService, models::user::User};
use server::{AppState, routes};
use services::services::{
    artifacts::ArtifactStore, claude_api::ClaudeApiClient, completion::CompletionClient,
    config::Config, db_check::SchemaCheck,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = DBService::new(&config.data_dir)
        .await
        .context("failed to open database")?;
    SchemaCheck::new(db.pool.clone())
        .run()
        .await
        .context("database schema check failed")?;

    if let Some(api_key) = &config.bootstrap_api_key {
        let user = User::ensure_bootstrap(&db.pool, "service@archforge.local", api_key)
            .await
            .context("failed to provision the bootstrap account")?;
        info!(user_id = %user.id, "bootstrap service account ready");
    }

    let llm: Arc<dyn CompletionClient> = Arc::new(
        ClaudeApiClient::from_env(config.claude_model.clone())
            .context("failed to construct the Claude client")?,
    );
    let artifacts = ArtifactStore::new(config.artifacts_dir.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        db,
        llm,
        artifacts,
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("server listening on http://{addr}");

    axum::serve(listener, routes::router(state)).await?;
    Ok(())
}
