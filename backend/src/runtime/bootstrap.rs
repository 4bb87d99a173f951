use anyhow::{Context, Result};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::runtime_assets::DEFAULT_INDEX_HTML;

/// Seeds the control page beside the executable. `config.json` is seeded by
/// `ConfigStore::load`.
pub async fn bootstrap_runtime_files(config: &AppConfig) -> Result<()> {
    let index = &config.web_index_path;
    if tokio::fs::try_exists(index).await.unwrap_or(false) {
        tracing::debug!(web_index = %index.display(), "control page present");
        return Ok(());
    }

    if let Some(parent) = index.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create web dir: {}", parent.display()))?;
    }
    tokio::fs::write(index, DEFAULT_INDEX_HTML)
        .await
        .with_context(|| format!("failed to write control page: {}", index.display()))?;
    tracing::info!(web_index = %index.display(), "bootstrapped default control page");
    Ok(())
}
