use crate::domain::{audit, CertConfig, ConfigError};
use crate::infrastructure::config_store::ConfigStore;

/// Control-plane access to the config store, with audit logging of writes.
#[derive(Clone)]
pub struct ConfigService {
    store: ConfigStore,
}

impl ConfigService {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    pub async fn get(&self) -> CertConfig {
        self.store.get().await
    }

    pub async fn replace(&self, raw: &[u8]) -> Result<CertConfig, ConfigError> {
        tracing::info!(
            action = "replace",
            payload = %audit::redact_raw_json(raw),
            "config mutation audit"
        );
        self.store.replace(raw).await.map_err(|error| {
            tracing::warn!(action = "replace", error = %error, "config endpoint rejected payload");
            error
        })
    }
}
