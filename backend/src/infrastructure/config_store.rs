use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{CertConfig, ConfigError};
use crate::infrastructure::runtime_assets::DEFAULT_CONFIG_JSON;

/// The single authoritative `CertConfig`, mirrored to `config.json`.
///
/// Readers get owned copies; writers swap the whole value under the write
/// lock, so nobody ever sees a half-applied document.
#[derive(Clone)]
pub struct ConfigStore {
    path: PathBuf,
    current: Arc<RwLock<CertConfig>>,
}

impl ConfigStore {
    /// Reads `path`, seeding the embedded defaults if the file is missing.
    ///
    /// An unreadable or corrupt document yields `CertConfig::default()` and a
    /// warning rather than an error, so the agent still comes up (with an
    /// empty identity and no install paths).
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = load_from_disk(&path).await;
        Self::with_value(path, initial)
    }

    pub fn with_value(path: impl Into<PathBuf>, config: CertConfig) -> Self {
        Self {
            path: path.into(),
            current: Arc::new(RwLock::new(config)),
        }
    }

    pub async fn get(&self) -> CertConfig {
        self.current.read().await.clone()
    }

    /// Validates `raw` as a complete document, persists it byte-for-byte and
    /// only then publishes it. On any error the previous value stays live.
    pub async fn replace(&self, raw: &[u8]) -> Result<CertConfig, ConfigError> {
        let next = serde_json::from_slice::<CertConfig>(raw)
            .map_err(|error| ConfigError::Parse(error.to_string()))?;

        let mut current = self.current.write().await;
        write_raw(&self.path, raw)
            .await
            .map_err(|error| ConfigError::Persist(format!("{error:#}")))?;
        *current = next.clone();
        drop(current);

        tracing::info!(
            config_path = %self.path.display(),
            ip_addr = %next.ip_addr,
            install_paths = next.install_paths.len(),
            web_enable = next.web_enable,
            "config replaced"
        );
        Ok(next)
    }
}

pub fn seeded_defaults() -> CertConfig {
    serde_json::from_str(DEFAULT_CONFIG_JSON)
        .expect("embedded templates/config/config.json must be valid CertConfig")
}

async fn load_from_disk(path: &Path) -> CertConfig {
    match tokio::fs::read(path).await {
        Ok(raw) => match serde_json::from_slice::<CertConfig>(&raw) {
            Ok(config) => {
                tracing::debug!(config_path = %path.display(), "loaded config");
                config
            }
            Err(error) => {
                tracing::warn!(
                    config_path = %path.display(),
                    error = %error,
                    "config file is not valid; starting with an empty config"
                );
                CertConfig::default()
            }
        },
        Err(error) if error.kind() == ErrorKind::NotFound => {
            if let Err(error) = write_raw(path, DEFAULT_CONFIG_JSON.as_bytes()).await {
                tracing::warn!(
                    config_path = %path.display(),
                    error = %format!("{error:#}"),
                    "failed to seed default config"
                );
            } else {
                tracing::info!(config_path = %path.display(), "seeded default config");
            }
            seeded_defaults()
        }
        Err(error) => {
            tracing::warn!(
                config_path = %path.display(),
                error = %error,
                "failed to read config file; starting with an empty config"
            );
            CertConfig::default()
        }
    }
}

async fn write_raw(path: &Path, raw: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create config dir: {}", parent.display()))?;
    }
    tokio::fs::write(path, raw)
        .await
        .with_context(|| format!("failed to write config: {}", path.display()))
}
