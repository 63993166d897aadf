//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure the log directory exists; a missing directory is created.
pub async fn ensure_env(log_dir: &str) -> anyhow::Result<()> {
    if log_dir.trim().is_empty() {
        warn!("log directory not configured; file logging disabled");
        return Ok(());
    }
    tokio::fs::create_dir_all(log_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {log_dir}: {e}"))?;
    Ok(())
}
