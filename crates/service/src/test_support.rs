#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Database tests run only against an explicitly configured PostgreSQL.
pub fn db_tests_enabled() -> bool {
    let _ = dotenvy::dotenv();
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}

fn test_config() -> DatabaseConfig {
    let mut cfg = DatabaseConfig::default();
    if let Ok(url) = std::env::var("DATABASE_URL") {
        cfg.url = url;
    }
    cfg.max_connections = cfg.max_connections.max(20);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.acquire_timeout_secs = 10;
    cfg
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    // Run migrations exactly once, with a throwaway connection
    MIGRATED
        .get_or_try_init(|| async {
            let db = connect_with_config(&test_config()).await?;
            migration::Migrator::up(&db, None).await?;
            drop(db);
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    // Return a fresh connection for the current test's runtime
    connect_with_config(&test_config()).await
}
