pub mod bootstrap;
pub mod scheduler;

use anyhow::Result;
use std::sync::Arc;

use crate::application::{RenewalPipeline, Toolchain};
use crate::domain::ports::CommandRunner;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::config_store::ConfigStore;
use crate::interface::http::AppState;
use crate::runtime::bootstrap::bootstrap_runtime_files;
use crate::runtime::scheduler::Scheduler;

pub async fn build_app(config: &AppConfig, runner: Arc<dyn CommandRunner>) -> Result<AppState> {
    if let Err(error) = bootstrap_runtime_files(config).await {
        tracing::warn!(error = %format!("{error:#}"), "failed to bootstrap runtime files");
    }

    let store = ConfigStore::load(&config.config_path).await;
    let pipeline = Arc::new(RenewalPipeline::new(runner, Toolchain::from(config)));
    let scheduler = Arc::new(Scheduler::new(
        pipeline,
        store.clone(),
        config.renew_interval,
    ));

    Ok(AppState::new(store, scheduler, config.web_index_path.clone()))
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
