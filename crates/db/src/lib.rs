use std::path::Path;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::info;

pub mod models;

#[derive(Clone)]
pub struct DBService {
    pub pool: SqlitePool,
}

impl DBService {
    /// Open (or create) the database under `data_dir` and run migrations.
    pub async fn new(data_dir: &Path) -> Result<Self, anyhow::Error> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("archforge.sqlite");

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!(path = %db_path.display(), "database ready");
        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection is kept alive so
    /// the database is not dropped between queries.
    pub async fn new_in_memory() -> Result<Self, anyhow::Error> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .shared_cache(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}
